use http::StatusCode;
use tandem_core::HttpError;
use tandem_routing::RoutingError;
use thiserror::Error;

/// Errors that can occur while serving a completion request
#[derive(Debug, Error)]
pub enum LlmError {
    /// Routing rejected the request or could not score it
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Completion backend failed or returned an error status
    #[error("backend error: {message}")]
    Upstream {
        /// Status returned by the backend, if it answered at all
        status: Option<u16>,
        message: String,
    },

    /// Completion backend did not answer before the request deadline
    #[error("backend did not respond before the request deadline")]
    Timeout,

    /// Client sent a malformed or unsupported request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Requested model does not exist
    #[error("model not found: {model}")]
    NotFound { model: String },

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Whether a client could reasonably retry the same request
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Routing(e) => e.is_retryable(),
            Self::Upstream { .. } | Self::Timeout => true,
            Self::InvalidRequest(_) | Self::NotFound { .. } | Self::Internal(_) => false,
        }
    }
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Routing(e) => {
                if e.is_input_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Timeout | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Routing(e) => match e {
                RoutingError::InvalidStrategy { .. } => "invalid_router",
                RoutingError::InvalidThreshold { .. } => "invalid_threshold",
                RoutingError::InvalidModelFormat { .. } => "invalid_model",
                RoutingError::EstimationFailure(_) => "estimation_error",
                RoutingError::Upstream { .. } => "upstream_error",
                RoutingError::InvalidCorpus(_) => "internal_error",
            },
            Self::Upstream { .. } | Self::Timeout => "upstream_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::NotFound { .. } => "not_found_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Routing(RoutingError::InvalidCorpus(_)) => {
                "an internal error occurred".to_owned()
            }
            other => other.to_string(),
        }
    }
}
