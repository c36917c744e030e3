//! Prompt embeddings from an OpenAI-compatible `/embeddings` endpoint

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod openai;

pub use error::{EmbeddingsError, Result};
pub use openai::OpenAiEmbedder;
