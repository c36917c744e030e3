use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tandem_config::EmbeddingsConfig;
use tandem_routing::{Embedder, RoutingError};
use url::Url;

use crate::error::{EmbeddingsError, Result};

/// Embeds prompts through an OpenAI-compatible embeddings API
pub struct OpenAiEmbedder {
    client: Client,
    api_key: Option<SecretString>,
    base_url: Url,
}

impl OpenAiEmbedder {
    pub fn new(base_url: Url, api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn from_config(config: &EmbeddingsConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    /// Strip the "provider/" prefix from a model name
    ///
    /// Model names may arrive as "openai/text-embedding-3-small"; the
    /// upstream API expects just "text-embedding-3-small"
    fn strip_model_prefix(model: &str) -> &str {
        model.split_once('/').map_or(model, |(_, model_name)| model_name)
    }

    /// Embed one text
    pub async fn embed_text(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url.as_str().trim_end_matches('/'));
        let wire_request = OpenAiEmbeddingRequest {
            input: text,
            model: Self::strip_model_prefix(model),
            encoding_format: "float",
        };

        tracing::debug!(model, chars = text.len(), "sending embeddings request");

        let mut request = self.client.post(&url).json(&wire_request);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "embeddings request failed");
            EmbeddingsError::ConnectionError(format!("failed to reach embeddings provider: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "unknown error".to_owned());
            tracing::error!(status = %status, "embeddings API error: {message}");
            return Err(EmbeddingsError::ProviderApiError {
                status: status.as_u16(),
                message,
            });
        }

        let wire_response: OpenAiEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingsError::MalformedResponse(e.to_string()))?;

        let embedding = wire_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingsError::MalformedResponse("no embedding returned".to_owned()))?;

        if embedding.is_empty() {
            return Err(EmbeddingsError::MalformedResponse("empty embedding".to_owned()));
        }

        Ok(embedding)
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str, model: &str) -> std::result::Result<Vec<f32>, RoutingError> {
        Ok(self.embed_text(text, model).await?)
    }
}

/// Wire format for the embeddings API request
#[derive(Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    encoding_format: &'a str,
}

/// Wire format for the embeddings API response
#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    async fn spawn(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/v1")).unwrap()
    }

    async fn echo_length(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let authorized = headers
            .get("authorization")
            .is_some_and(|v| v == "Bearer sk-test");
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
        }

        assert_eq!(body["model"], "text-embedding-3-small");
        #[allow(clippy::cast_precision_loss)]
        let len = body["input"].as_str().unwrap().len() as f64;

        (
            StatusCode::OK,
            Json(json!({
                "object": "list",
                "data": [{"object": "embedding", "embedding": [len, 1.0], "index": 0}],
                "model": "text-embedding-3-small",
                "usage": {"prompt_tokens": 1, "total_tokens": 1}
            })),
        )
    }

    #[test]
    fn strips_provider_prefix() {
        assert_eq!(
            OpenAiEmbedder::strip_model_prefix("openai/text-embedding-3-small"),
            "text-embedding-3-small"
        );
        assert_eq!(OpenAiEmbedder::strip_model_prefix("bare"), "bare");
    }

    #[tokio::test]
    async fn embeds_through_the_api() {
        let base_url = spawn(Router::new().route("/v1/embeddings", post(echo_length))).await;
        let embedder = OpenAiEmbedder::new(base_url, Some(SecretString::from("sk-test")));

        let embedding = embedder.embed("four", "openai/text-embedding-3-small").await.unwrap();

        assert_eq!(embedding, vec![4.0, 1.0]);
    }

    #[tokio::test]
    async fn api_errors_surface_as_upstream() {
        let base_url = spawn(Router::new().route("/v1/embeddings", post(echo_length))).await;
        let embedder = OpenAiEmbedder::new(base_url, None);

        let err = embedder.embed_text("four", "text-embedding-3-small").await.unwrap_err();
        assert!(matches!(err, EmbeddingsError::ProviderApiError { status: 401, .. }));

        let routing: RoutingError = err.into();
        assert!(matches!(routing, RoutingError::Upstream { timed_out: false, .. }));
    }

    #[tokio::test]
    async fn empty_data_is_malformed() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|| async { Json(json!({"object": "list", "data": []})) }),
        );
        let embedder = OpenAiEmbedder::new(spawn(router).await, None);

        let err = embedder.embed_text("hi", "m").await.unwrap_err();

        assert!(matches!(err, EmbeddingsError::MalformedResponse(_)));
    }
}
