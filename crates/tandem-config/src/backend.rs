use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default OpenAI-compatible API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible completion backend that routed requests are forwarded to
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL, including the version segment (e.g. `https://api.openai.com/v1`)
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Bearer token sent with every forwarded request
    #[serde(default)]
    pub api_key: Option<SecretString>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

pub(crate) fn default_base_url() -> Url {
    Url::parse(DEFAULT_OPENAI_BASE_URL).expect("valid default URL")
}
