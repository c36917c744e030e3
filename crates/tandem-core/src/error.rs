use http::StatusCode;
use serde::Serialize;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. The server layer
/// converts these into actual HTTP responses, keeping domain errors
/// decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `invalid_threshold`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Wire body for this error
    fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.client_message(),
            kind: self.error_type().to_owned(),
        }
    }
}

/// JSON error body returned on every failed request
///
/// Serializes as `{"error": "<message>", "type": "<kind>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Machine-readable kind
    #[serde(rename = "type")]
    pub kind: String,
}
