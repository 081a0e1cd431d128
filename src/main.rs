// src/main.rs
mod config;
mod enrich;
mod error;
mod handlers;
mod models;
mod monitor;
mod notify;
mod query;
mod state;
mod status;
mod storage;
#[cfg(test)]
mod testing;
mod utils;

use actix_web::{web, App, HttpServer};
use env_logger::Env;
use governor::RateLimiter;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use crate::config::Config;
use crate::enrich::{Enricher, GeminiEnricher};
use crate::handlers::interactions::parse_public_key;
use crate::monitor::{NotificationDispatcher, Scheduler};
use crate::notify::DiscordClient;
use crate::state::AppState;
use crate::status::{SlpClient, StatusSource};
use crate::storage::memory::ServerStateStore;
use crate::utils::IpRateLimiter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // `.env` may carry RUST_LOG, so it has to be loaded before the logger.
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    let public_key = config
        .discord_public_key
        .as_deref()
        .map(parse_public_key)
        .transpose()
        .map_err(startup_error)?;

    let discord = Arc::new(
        DiscordClient::new(
            &config.discord_api_base,
            &config.discord_token,
            &config.channel_id,
            config.discord_timeout(),
        )
        .map_err(startup_error)?,
    );
    if config.register_commands {
        match config.discord_application_id.as_deref() {
            Some(application_id) => {
                if let Err(e) = discord.register_commands(application_id).await {
                    error!("Failed to register slash command: {}", e);
                }
            }
            None => warn!("REGISTER_COMMANDS is set but DISCORD_APPLICATION_ID is missing"),
        }
    }

    let enricher: Option<Arc<dyn Enricher>> = match config.gemini_api_key.as_deref() {
        Some(api_key) => {
            info!("Join enrichment enabled with model {}", config.gemini_model);
            let gemini = GeminiEnricher::new(
                &config.gemini_api_base,
                api_key,
                &config.gemini_model,
                config.enrich_timeout(),
            )
            .map_err(startup_error)?;
            Some(Arc::new(gemini))
        }
        None => {
            info!("GEMINI_API_KEY not set, join messages use plain text");
            None
        }
    };

    let source: Arc<dyn StatusSource> = Arc::new(SlpClient::new(config.query_timeout()));
    let scheduler = Arc::new(Scheduler::new(
        config.servers.clone(),
        Arc::clone(&source),
        Arc::new(ServerStateStore::new()),
        NotificationDispatcher::new(discord.clone(), enricher),
        config.check_interval(),
        config.notify_on_first_poll,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    let interactions_enabled = public_key.is_some();
    let state = web::Data::new(AppState {
        servers: config.servers.clone(),
        source,
        discord,
        public_key,
        started_at: Instant::now(),
    });
    let status_rate_limiter: web::Data<IpRateLimiter> =
        web::Data::new(RateLimiter::keyed(config.status_quota));

    let bind = format!("{}:{}", config.bind_address, config.port);
    info!("🌐 HTTP server listening on {}", bind);
    let result = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(status_rate_limiter.clone())
            .configure(|cfg| handlers::configure(cfg, interactions_enabled))
    })
        .bind(&bind)?
        .run().await;

    shutdown_tx.send(true).ok();
    if let Err(e) = scheduler_handle.await {
        error!("Scheduler task failed: {}", e);
    }
    info!("Shutdown complete.");
    result
}

fn startup_error<E>(e: E) -> std::io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    error!("Startup failed: {}", e);
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
}
