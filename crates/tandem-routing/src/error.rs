//! Routing-specific error types

use tandem_core::Elapsed;
use thiserror::Error;

/// Errors raised while deciding which model serves a prompt
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Strategy name is empty or not registered
    #[error("invalid router '{name}'; available routers are: {available}")]
    InvalidStrategy { name: String, available: String },

    /// Threshold is missing, unparsable, or outside [0, 1]
    #[error("invalid threshold '{value}'; threshold must be a number between 0.0 and 1.0")]
    InvalidThreshold { value: String },

    /// Model identifier is not of the form `router-<name>-<threshold>`
    #[error("invalid model '{model}'; expected the form 'router-<router name>-<threshold>'")]
    InvalidModelFormat { model: String },

    /// Rating optimizer did not converge or was handed unusable input
    #[error("rating estimation failed: {0}")]
    EstimationFailure(String),

    /// An external dependency (embedder, predictor) failed or timed out
    #[error("upstream failure: {message}")]
    Upstream { message: String, timed_out: bool },

    /// Arena battles or embeddings could not be loaded
    #[error("invalid arena corpus: {0}")]
    InvalidCorpus(String),
}

impl RoutingError {
    /// Wrap an upstream failure message
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Whether the caller supplied the bad input, as opposed to a
    /// dependency or internal failure
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidStrategy { .. } | Self::InvalidThreshold { .. } | Self::InvalidModelFormat { .. }
        )
    }

    /// Whether the same request might succeed later
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

impl From<Elapsed> for RoutingError {
    fn from(elapsed: Elapsed) -> Self {
        Self::Upstream {
            message: elapsed.to_string(),
            timed_out: true,
        }
    }
}
