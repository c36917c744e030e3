use async_trait::async_trait;

use crate::error::RoutingError;

/// Turns text into an embedding vector
///
/// Implementations cross the process boundary; callers bound them with a
/// [`tandem_core::Deadline`].
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, RoutingError>;
}
