use tandem_routing::RoutingError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingsError>;

/// Errors raised while embedding a prompt
#[derive(Debug, Error)]
pub enum EmbeddingsError {
    /// The provider could not be reached
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// The provider answered with a non-success status
    #[error("embeddings provider returned {status}: {message}")]
    ProviderApiError { status: u16, message: String },

    /// The provider answered with something other than one embedding
    #[error("malformed embeddings response: {0}")]
    MalformedResponse(String),
}

impl From<EmbeddingsError> for RoutingError {
    fn from(error: EmbeddingsError) -> Self {
        Self::upstream(error.to_string())
    }
}
