//! Strategies backed by an opaque predictor
//!
//! BERT, causal-LM and matrix-factorization classifiers are served out
//! of process; the router only sees a prompt go in and a score come out.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tandem_core::Deadline;
use url::Url;

use super::Strategy;
use crate::error::RoutingError;

/// Produces a strong-preference score for a prompt
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, prompt: &str) -> Result<f64, RoutingError>;
}

/// Wraps a [`Predictor`] and enforces the score contract
pub struct ExternalPredictorStrategy {
    name: String,
    predictor: Box<dyn Predictor>,
    concurrent: bool,
}

impl ExternalPredictorStrategy {
    /// `concurrent` declares whether the predictor tolerates parallel calls
    pub fn new(name: impl Into<String>, predictor: impl Predictor + 'static, concurrent: bool) -> Self {
        Self {
            name: name.into(),
            predictor: Box::new(predictor),
            concurrent,
        }
    }
}

impl std::fmt::Debug for ExternalPredictorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalPredictorStrategy")
            .field("name", &self.name)
            .field("concurrent", &self.concurrent)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Strategy for ExternalPredictorStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_concurrent_scoring(&self) -> bool {
        self.concurrent
    }

    async fn score(&self, prompt: &str, deadline: Deadline) -> Result<f64, RoutingError> {
        let score = deadline.run(self.predictor.predict(prompt)).await??;

        if !(0.0..=1.0).contains(&score) {
            return Err(RoutingError::upstream(format!(
                "predictor for '{}' returned score {score} outside [0, 1]",
                self.name
            )));
        }

        Ok(score)
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    score: f64,
}

/// Predictor reached over HTTP
///
/// POSTs `{"prompt": "..."}` and expects `{"score": <float>}` back.
#[derive(Debug, Clone)]
pub struct RemotePredictor {
    client: Client,
    url: Url,
}

impl RemotePredictor {
    pub fn new(url: Url) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Predictor for RemotePredictor {
    async fn predict(&self, prompt: &str) -> Result<f64, RoutingError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&PredictRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %self.url, error = %e, "predictor request failed");
                RoutingError::upstream(format!("failed to reach predictor: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::upstream(format!("predictor returned {status}: {body}")));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::upstream(format!("malformed predictor response: {e}")))?;

        Ok(body.score)
    }
}
