// src/state.rs
use ed25519_dalek::VerifyingKey;
use std::sync::Arc;
use std::time::Instant;
use crate::models::server::ServerConfig;
use crate::notify::DiscordClient;
use crate::status::StatusSource;

/// Shared by every HTTP worker. Holds no monitor state, so on-demand reads
/// never contend with the scheduler.
pub struct AppState {
    pub servers: Vec<ServerConfig>,
    pub source: Arc<dyn StatusSource>,
    pub discord: Arc<DiscordClient>,
    /// Present only when the interactions endpoint is enabled.
    pub public_key: Option<VerifyingKey>,
    pub started_at: Instant,
}
