// src/handlers/interactions.rs
//! Discord interactions webhook for the `/now` slash command.

use actix_web::{web, HttpRequest, HttpResponse};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::json;
use crate::error::ConfigError;
use crate::query::now_report;
use crate::state::AppState;
use crate::utils::RequestError;

const PING: u8 = 1;
const APPLICATION_COMMAND: u8 = 2;

const PONG: u8 = 1;
const CHANNEL_MESSAGE: u8 = 4;
const DEFERRED_CHANNEL_MESSAGE: u8 = 5;

/// Signed requests older or newer than this are treated as replays.
const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

#[derive(Deserialize)]
struct Interaction {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    application_id: String,
    #[serde(default)]
    token: String,
    data: Option<CommandData>,
}

#[derive(Deserialize)]
struct CommandData {
    name: String,
}

pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key: "DISCORD_PUBLIC_KEY",
        value: hex_key.to_string(),
    };
    let bytes: [u8; 32] = hex::decode(hex_key.trim())
        .map_err(|_| invalid())?
        .try_into()
        .map_err(|_| invalid())?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| invalid())
}

/// Checks Discord's Ed25519 signature over `timestamp || body`.
pub fn verify_signature(
    key: &VerifyingKey,
    timestamp: &str,
    body: &[u8],
    signature_hex: &str,
) -> Result<(), RequestError> {
    let bytes: [u8; 64] = hex::decode(signature_hex)
        .map_err(|_| RequestError::InvalidSignature)?
        .try_into()
        .map_err(|_| RequestError::InvalidSignature)?;
    let signature = Signature::from_bytes(&bytes);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);
    key.verify(&message, &signature)
        .map_err(|_| RequestError::InvalidSignature)
}

/// `timestamp` is Unix seconds, as Discord sends it.
pub fn check_timestamp(timestamp: &str, now: i64) -> Result<(), RequestError> {
    let sent_at: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| RequestError::StaleTimestamp)?;
    if (now - sent_at).abs() > MAX_TIMESTAMP_SKEW_SECS {
        return Err(RequestError::StaleTimestamp);
    }
    Ok(())
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

pub async fn handle_interaction(
    req: HttpRequest,
    state: web::Data<AppState>,
    bytes: web::Bytes,
) -> Result<HttpResponse, RequestError> {
    let Some(key) = state.public_key.as_ref() else {
        return Err(RequestError::InvalidSignature);
    };
    let (Some(signature), Some(timestamp)) = (
        header(&req, "X-Signature-Ed25519"),
        header(&req, "X-Signature-Timestamp"),
    ) else {
        return Err(RequestError::MissingSignature);
    };
    if let Err(e) = verify_signature(key, timestamp, &bytes, signature) {
        warn!("Rejected interaction with bad signature");
        return Err(e);
    }
    if let Err(e) = check_timestamp(timestamp, chrono::Utc::now().timestamp()) {
        warn!("Rejected interaction with stale timestamp {:?}", timestamp);
        return Err(e);
    }

    let interaction: Interaction = serde_json::from_slice(&bytes)
        .map_err(|e| RequestError::BadInteraction(e.to_string()))?;

    match interaction.kind {
        PING => {
            debug!("Answering interactions PING");
            Ok(HttpResponse::Ok().json(json!({ "type": PONG })))
        }
        APPLICATION_COMMAND => {
            let name = interaction.data.map(|d| d.name).unwrap_or_default();
            if name != "now" {
                warn!("Unknown command {:?}", name);
                return Ok(HttpResponse::Ok().json(json!({
                    "type": CHANNEL_MESSAGE,
                    "data": { "content": format!("Unknown command `{}`", name) }
                })));
            }

            info!("Handling /now");
            let state = state.into_inner();
            let (application_id, token) = (interaction.application_id, interaction.token);
            tokio::spawn(async move {
                let report = now_report(&state.servers, state.source.clone()).await;
                if let Err(e) = state
                    .discord
                    .edit_original_response(&application_id, &token, &report)
                    .await
                {
                    error!("Failed to deliver /now reply: {}", e);
                }
            });
            Ok(HttpResponse::Ok().json(json!({ "type": DEFERRED_CHANNEL_MESSAGE })))
        }
        other => Err(RequestError::BadInteraction(format!("unsupported type {}", other))),
    }
}
