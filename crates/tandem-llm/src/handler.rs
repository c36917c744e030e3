//! Axum route handlers for the `OpenAI`-compatible and routing endpoints

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tandem_core::HttpError;
use tandem_routing::MODEL_PREFIX;

use crate::error::LlmError;
use crate::state::LlmState;
use crate::types::{CompletionRequest, ModelInfo, ModelList, ScoresRequest, ScoresResponse};

/// Owner reported for every listed model
const OWNED_BY: &str = "tandem";

/// Build the LLM router with all endpoints
pub fn llm_router(state: LlmState) -> Router {
    Router::new()
        .route("/v1/chat/completions", routing::post(completions))
        .route("/v1/completions", routing::post(completions))
        .route("/v1/models", routing::get(list_models))
        .route("/v1/models/{id}", routing::get(retrieve_model))
        .route("/v1/routing/usage", routing::get(usage))
        .route("/v1/routing/scores", routing::post(scores))
        .with_state(state)
}

/// Handle `POST /v1/chat/completions` and `POST /v1/completions`
async fn completions(
    State(state): State<LlmState>,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(&LlmError::InvalidRequest(rejection.body_text())),
    };

    match state.complete(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<LlmState>) -> Json<ModelList> {
    let created = unix_now();
    let data = state
        .controller()
        .model_identifiers()
        .into_iter()
        .map(|id| model_info(id, created))
        .collect();

    Json(ModelList {
        object: "list".to_owned(),
        data,
    })
}

/// Handle `GET /v1/models/{id}`
async fn retrieve_model(Path(id): Path<String>) -> Response {
    if !id.starts_with(MODEL_PREFIX) {
        return error_response(&LlmError::NotFound { model: id });
    }

    Json(model_info(id, unix_now())).into_response()
}

/// Handle `GET /v1/routing/usage`
async fn usage(State(state): State<LlmState>) -> Response {
    Json(state.controller().usage().snapshot()).into_response()
}

/// Handle `POST /v1/routing/scores`
async fn scores(State(state): State<LlmState>, body: Result<Json<ScoresRequest>, JsonRejection>) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(&LlmError::InvalidRequest(rejection.body_text())),
    };

    match state.controller().batch_score(&request.prompts, &request.router).await {
        Ok(scores) => Json(ScoresResponse {
            router: request.router,
            scores,
        })
        .into_response(),
        Err(e) => error_response(&LlmError::from(e)),
    }
}

fn model_info(id: String, created: u64) -> ModelInfo {
    ModelInfo {
        id,
        object: "model".to_owned(),
        created,
        owned_by: OWNED_BY.to_owned(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Convert an LLM error to a `{"error", "type"}` JSON response
fn error_response(error: &LlmError) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = %error, "request failed");
    } else {
        tracing::debug!(error = %error, "request rejected");
    }

    (status, Json(error.body())).into_response()
}
