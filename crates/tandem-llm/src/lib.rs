//! Completion serving for Tandem
//!
//! Accepts `OpenAI`-style completion requests, asks the routing controller
//! which model of the strong/weak pair should answer, and forwards the
//! rewritten request to an `OpenAI`-compatible backend.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod error;
mod handler;
mod state;
pub mod types;

pub use backend::{CompletionBackend, OpenAiBackend};
pub use error::LlmError;
pub use handler::llm_router;
pub use state::LlmState;
pub use types::{CompletionRequest, Endpoint};
