//! Completion backend client

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tandem_config::BackendConfig;
use url::Url;

use crate::error::LlmError;
use crate::types::{CompletionRequest, Endpoint};

/// Serves completions for a resolved model
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Forward `request` to `endpoint` and return the backend's response
    /// body untouched
    async fn complete(&self, endpoint: Endpoint, request: &CompletionRequest) -> Result<Value, LlmError>;
}

/// Backend speaking the `OpenAI` completion API
pub struct OpenAiBackend {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl OpenAiBackend {
    pub fn new(base_url: Url, api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    fn url(&self, endpoint: Endpoint) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}", endpoint.path())
    }
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, endpoint: Endpoint, request: &CompletionRequest) -> Result<Value, LlmError> {
        let mut builder = self.client.post(self.url(endpoint)).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "backend request failed");
            LlmError::Upstream {
                status: None,
                message: format!("failed to reach backend: {e}"),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "backend returned error");
            return Err(LlmError::Upstream {
                status: Some(status.as_u16()),
                message: format!("backend returned {status}: {body}"),
            });
        }

        response.json().await.map_err(|e| LlmError::Upstream {
            status: Some(status.as_u16()),
            message: format!("failed to parse backend response: {e}"),
        })
    }
}
