//! `OpenAI`-style wire types
//!
//! Completion requests are only partly typed: the fields routing needs are
//! read, everything else rides along in `extra` and reaches the backend
//! unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tandem_routing::{RoutingError, parse_threshold};

use crate::error::LlmError;

/// Chat or legacy text completion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Requested model; `router-<name>-<threshold>` selects routing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Conversation messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    /// Prompt text for the legacy completions API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Value>,
    /// Strategy name, used when `model` does not encode one
    #[serde(default, skip_serializing)]
    pub router: Option<String>,
    /// Score cutoff, used when `model` does not encode one; a number or
    /// numeric string, checked only when routing reads it
    #[serde(default, skip_serializing)]
    pub threshold: Option<Value>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Every other field, forwarded as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One conversation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Message content is either a string or a list of typed parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single content part such as `{"type": "text", "text": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Backend API a request is forwarded to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatCompletions,
    Completions,
}

impl Endpoint {
    /// Path relative to the backend base URL
    pub const fn path(self) -> &'static str {
        match self {
            Self::ChatCompletions => "chat/completions",
            Self::Completions => "completions",
        }
    }
}

impl MessageContent {
    /// Plain text of this content; text parts are joined by newlines
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter(|part| part.kind == "text")
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl CompletionRequest {
    /// Which backend API serves this request
    ///
    /// Requests carrying `messages` are chat completions; requests with
    /// only a `prompt` go to the legacy completions API.
    pub const fn endpoint(&self) -> Endpoint {
        if self.messages.is_none() && self.prompt.is_some() {
            Endpoint::Completions
        } else {
            Endpoint::ChatCompletions
        }
    }

    /// The `threshold` field as a number, if present
    pub fn requested_threshold(&self) -> Result<Option<f64>, RoutingError> {
        match &self.threshold {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number.as_f64().map(Some).ok_or_else(|| RoutingError::InvalidThreshold {
                value: number.to_string(),
            }),
            Some(Value::String(raw)) => parse_threshold(raw).map(Some),
            Some(other) => Err(RoutingError::InvalidThreshold {
                value: other.to_string(),
            }),
        }
    }

    /// Text the routing strategy scores
    ///
    /// The last message for chat requests, the prompt for legacy ones.
    pub fn routed_prompt(&self) -> Result<String, LlmError> {
        if let Some(messages) = &self.messages {
            let last = messages
                .last()
                .ok_or_else(|| LlmError::InvalidRequest("messages must not be empty".to_owned()))?;
            return Ok(last.content.as_ref().map(MessageContent::text).unwrap_or_default());
        }

        match &self.prompt {
            Some(Value::String(prompt)) => Ok(prompt.clone()),
            // Batched legacy prompts are routed on their last entry
            Some(Value::Array(prompts)) => prompts
                .last()
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| LlmError::InvalidRequest("prompt must be a string or a list of strings".to_owned())),
            Some(_) => Err(LlmError::InvalidRequest(
                "prompt must be a string or a list of strings".to_owned(),
            )),
            None => Err(LlmError::InvalidRequest(
                "request must include either messages or prompt".to_owned(),
            )),
        }
    }
}

/// Entry in the model list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}

/// `GET /v1/models` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

/// `POST /v1/routing/scores` request
#[derive(Debug, Clone, Deserialize)]
pub struct ScoresRequest {
    pub router: String,
    pub prompts: Vec<String>,
}

/// `POST /v1/routing/scores` response; `scores[i]` belongs to `prompts[i]`
#[derive(Debug, Clone, Serialize)]
pub struct ScoresResponse {
    pub router: String,
    pub scores: Vec<f64>,
}
