// src/notify/discord.rs
use async_trait::async_trait;
use log::{debug, info};
use serde_json::json;
use std::time::Duration;
use crate::error::SendError;
use super::Notifier;

pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    channel_id: String,
}

impl DiscordClient {
    /// Every request is bounded by `timeout`, so a stalled Discord call
    /// cannot hold a server's poll slot.
    pub fn new(
        api_base: &str,
        token: &str,
        channel_id: &str,
        timeout: Duration,
    ) -> Result<Self, SendError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            channel_id: channel_id.to_string(),
        })
    }

    /// Replaces the deferred reply of an interaction. Uses the interaction
    /// token, so no bot authorization header is sent.
    pub async fn edit_original_response(
        &self,
        application_id: &str,
        interaction_token: &str,
        content: &str,
    ) -> Result<(), SendError> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base, application_id, interaction_token
        );
        let response = self
            .http
            .patch(&url)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        check_status(response).await
    }

    /// Registers the global `/now` slash command for the application.
    pub async fn register_commands(&self, application_id: &str) -> Result<(), SendError> {
        info!("Registering slash command...");
        let url = format!("{}/applications/{}/commands", self.api_base, application_id);
        let commands = json!([{
            "name": "now",
            "description": "Check how many players are online on each server.",
            "type": 1
        }]);
        let response = self
            .http
            .put(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&commands)
            .send()
            .await?;
        check_status(response).await?;
        info!("Slash command registered.");
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordClient {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        let url = format!("{}/channels/{}/messages", self.api_base, self.channel_id);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&json!({ "content": text }))
            .send()
            .await?;
        check_status(response).await?;
        debug!("Posted message to channel {}", self.channel_id);
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), SendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_string());
    Err(SendError::Status {
        status: status.as_u16(),
        body,
    })
}
