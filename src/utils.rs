// src/utils.rs
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::RateLimiter;
use log::debug;
use serde_json::json;
use std::net::IpAddr;

pub type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Failed to extract client IP")]
    MissingPeerIP,
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Missing domain parameter.")]
    MissingDomain,
    #[error("Invalid port parameter: {0}")]
    InvalidPort(String),
    #[error("Missing request signature")]
    MissingSignature,
    #[error("Invalid request signature")]
    InvalidSignature,
    #[error("Stale request timestamp")]
    StaleTimestamp,
    #[error("Malformed interaction: {0}")]
    BadInteraction(String),
    #[error("{0}")]
    Unreachable(String),
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::MissingSignature | Self::InvalidSignature | Self::StaleTimestamp => {
                StatusCode::UNAUTHORIZED
            }
            Self::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Unreachable(reason) => json!({ "online": false, "error": reason }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// First hop of `X-Forwarded-For` when behind a proxy, else the socket peer.
pub fn client_ip(req: &HttpRequest) -> Result<IpAddr, RequestError> {
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(Ok(ip)) = value.split(',').next().map(|ip| ip.trim().parse::<IpAddr>()) {
                debug!("Using X-Forwarded-For address {}", ip);
                return Ok(ip);
            }
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip())
        .ok_or(RequestError::MissingPeerIP)
}
