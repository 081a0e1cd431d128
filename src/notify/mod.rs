use async_trait::async_trait;
use crate::error::SendError;

pub mod discord;
pub use discord::DiscordClient;

/// The single outbound channel notifications are posted to.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), SendError>;
}
