// src/handlers/index.rs
use actix_web::{web, HttpResponse};
use serde_json::json;
use crate::state::AppState;

pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "Bot is running!",
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
