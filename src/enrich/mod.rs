use async_trait::async_trait;
use crate::error::EnrichError;

pub mod gemini;
pub use gemini::GeminiEnricher;

/// Optional text generation for join announcements. Callers must fall back to
/// plain formatting on any error.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn summarize(&self, names: &[String]) -> Result<String, EnrichError>;
}
