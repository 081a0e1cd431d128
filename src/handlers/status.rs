// src/handlers/status.rs
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error};
use serde::Deserialize;
use crate::models::server::DEFAULT_PORT;
use crate::query::{now_report, query_one};
use crate::state::AppState;
use crate::utils::{client_ip, IpRateLimiter, RequestError};

#[derive(Deserialize)]
pub struct StatusQuery {
    domain: Option<String>,
    port: Option<String>,
}

pub async fn get_status(
    req: HttpRequest,
    query: web::Query<StatusQuery>,
    state: web::Data<AppState>,
    rate_limiter: web::Data<IpRateLimiter>,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = client_ip(&req)?;

    // Rate Limiting
    if rate_limiter.check_key(&peer_ip).is_err() {
        error!("Rate limit exceeded for status lookup for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let domain = match query.domain.as_deref().map(str::trim) {
        Some(domain) if !domain.is_empty() => domain,
        _ => return Err(RequestError::MissingDomain),
    };
    let port = match query.port.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_PORT,
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| RequestError::InvalidPort(raw.to_string()))?,
    };

    debug!("On-demand status lookup for {}:{} from {}", domain, port, peer_ip);
    match query_one(state.source.as_ref(), domain, port).await {
        Ok(status) => Ok(HttpResponse::Ok().json(status)),
        Err(e) => {
            error!("Status lookup for {}:{} failed: {}", domain, port, e);
            Err(RequestError::Unreachable(e.to_string()))
        }
    }
}

/// Queries every configured server, so it shares the `/status` quota.
pub async fn get_now(
    req: HttpRequest,
    state: web::Data<AppState>,
    rate_limiter: web::Data<IpRateLimiter>,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = client_ip(&req)?;
    if rate_limiter.check_key(&peer_ip).is_err() {
        error!("Rate limit exceeded for /now for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let report = now_report(&state.servers, state.source.clone()).await;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(report))
}
