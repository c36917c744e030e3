//! Typed configuration for the Tandem router
//!
//! Loaded from a TOML file with `{{ env.VAR }}` placeholders expanded
//! before parsing. Every section denies unknown keys so typos surface at
//! startup instead of silently falling back to defaults.

#![allow(clippy::must_use_candidate)]

pub mod backend;
pub mod embeddings;
mod env;
pub mod health;
mod loader;
pub mod routing;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use backend::*;
pub use embeddings::*;
pub use health::*;
pub use routing::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level Tandem configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Model pair and routing strategies
    pub routing: RoutingConfig,
    /// Completion backend requests are forwarded to
    #[serde(default)]
    pub backend: BackendConfig,
    /// Embedding provider used by similarity-weighted strategies
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
