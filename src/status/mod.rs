use async_trait::async_trait;
use crate::error::QueryError;
use crate::models::server::ServerSnapshot;

pub mod slp;
pub use slp::SlpClient;

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Queries one server. Implementations bound their own latency.
    async fn query_status(&self, host: &str, port: u16) -> Result<ServerSnapshot, QueryError>;
}
