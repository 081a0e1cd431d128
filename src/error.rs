// src/error.rs
use std::time::Duration;

/// A server could not be queried. Recovered per server by marking it unreachable.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("malformed status payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A notification could not be delivered. Logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("discord returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gemini returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("response contained no text")]
    Empty,
}

/// Startup-fatal configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("server name {0:?} is configured more than once")]
    DuplicateServer(String),
    #[error("no servers configured")]
    NoServers,
}
