//! Completion flow: route, rewrite, forward

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tandem_routing::RoutingController;
use tandem_telemetry::{Histogram, KeyValue, metrics};

use crate::backend::CompletionBackend;
use crate::error::LlmError;
use crate::types::CompletionRequest;

/// Shared state for LLM route handlers
#[derive(Clone)]
pub struct LlmState {
    pub(crate) inner: Arc<LlmStateInner>,
}

pub(crate) struct LlmStateInner {
    pub(crate) controller: Arc<RoutingController>,
    backend: Box<dyn CompletionBackend>,
    request_duration: Histogram<f64>,
}

impl LlmState {
    pub fn new(controller: Arc<RoutingController>, backend: impl CompletionBackend + 'static) -> Self {
        let request_duration = metrics::meter()
            .f64_histogram(metrics::LLM_REQUEST_DURATION)
            .with_unit("s")
            .with_description("End-to-end completion request duration")
            .build();

        Self {
            inner: Arc::new(LlmStateInner {
                controller,
                backend: Box::new(backend),
                request_duration,
            }),
        }
    }

    pub fn controller(&self) -> &RoutingController {
        &self.inner.controller
    }

    /// Route a completion request to the strong or weak model and return
    /// the backend's response
    ///
    /// The strategy and threshold come from a `router-<name>-<threshold>`
    /// model, or failing that from the `router` and `threshold` fields.
    /// Routing and the backend call share one deadline.
    pub async fn complete(&self, request: CompletionRequest) -> Result<Value, LlmError> {
        let start = Instant::now();
        let result = self.route_and_forward(request).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::record_duration(&self.inner.request_duration, start, &[KeyValue::new("status", status)]);

        result
    }

    async fn route_and_forward(&self, mut request: CompletionRequest) -> Result<Value, LlmError> {
        if request.stream == Some(true) {
            return Err(LlmError::InvalidRequest("streaming responses are not supported".to_owned()));
        }

        let controller = self.controller();
        let (strategy, threshold) = controller.resolve_target(request.model.as_deref(), request.router.as_deref(), || {
            request.requested_threshold()
        })?;
        let prompt = request.routed_prompt()?;
        let endpoint = request.endpoint();

        let deadline = controller.deadline();
        let model = controller.route_until(&prompt, &strategy, threshold, deadline).await?;

        request.model = Some(model);
        request.router = None;
        request.threshold = None;

        deadline
            .run(self.inner.backend.complete(endpoint, &request))
            .await
            .map_err(|elapsed| {
                tracing::warn!(budget_ms = elapsed.budget.as_millis(), "backend timed out");
                LlmError::Timeout
            })?
    }
}

impl std::fmt::Debug for LlmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmState")
            .field("controller", &self.inner.controller)
            .finish_non_exhaustive()
    }
}
