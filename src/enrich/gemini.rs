// src/enrich/gemini.rs
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use std::time::Duration;
use crate::error::EnrichError;
use super::Enricher;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const SYSTEM_INSTRUCTION: &str = "Based on the input, generate a quick, short message to motivate friends join playing minecraft. \n\nThe message should begin with \"(Player's names) just joined the Minecraft server, \" and follow with a motivating call-to-action.\n\nInput: 'Joined player: {a_list_of_player_names}'\n";

pub struct GeminiEnricher {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiEnricher {
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, EnrichError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    async fn generate(&self, names: &[String]) -> Result<String, EnrichError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("Joined player: {}", names.join(", ")) }]
            }],
            "generationConfig": {
                "temperature": 2,
                "thinkingConfig": { "thinkingBudget": 1000 }
            }
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_string());
            return Err(EnrichError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        extract_text(&json)
    }
}

#[async_trait]
impl Enricher for GeminiEnricher {
    async fn summarize(&self, names: &[String]) -> Result<String, EnrichError> {
        let text = match tokio::time::timeout(self.timeout, self.generate(names)).await {
            Ok(Err(EnrichError::Http(e))) if e.is_timeout() => {
                return Err(EnrichError::Timeout(self.timeout))
            }
            Ok(result) => result?,
            Err(_) => return Err(EnrichError::Timeout(self.timeout)),
        };
        debug!("Gemini produced {} chars for {} player(s)", text.len(), names.len());
        Ok(text)
    }
}

/// Concatenates `candidates[0].content.parts[*].text`.
fn extract_text(json: &Value) -> Result<String, EnrichError> {
    let text: String = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(EnrichError::Empty);
    }
    Ok(text.to_string())
}
