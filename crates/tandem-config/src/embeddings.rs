use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::backend::default_base_url;

/// OpenAI-compatible embeddings endpoint used to embed incoming prompts
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingsConfig {
    /// Base URL, including the version segment
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}
