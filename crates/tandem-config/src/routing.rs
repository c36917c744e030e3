use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

/// Strong model named in arena data when none is configured
pub const DEFAULT_ARENA_STRONG_MODEL: &str = "gpt-4-1106-preview";
/// Weak model named in arena data when none is configured
pub const DEFAULT_ARENA_WEAK_MODEL: &str = "mixtral-8x7b-instruct-v0.1";
/// Embedding model used for prompt similarity
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Model pair and the strategies that choose between them
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Backend model id served when the strong model is chosen
    pub strong_model: String,
    /// Backend model id served when the weak model is chosen
    pub weak_model: String,
    /// Budget for every external call made on behalf of one request (e.g. "30s")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Strategies keyed by the name clients use in `router-<name>-<threshold>`
    #[serde(default)]
    pub strategies: IndexMap<String, StrategyConfig>,
}

impl RoutingConfig {
    /// Parse the configured request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is malformed
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.timeout)
            .map_err(|e| anyhow::anyhow!("invalid routing.timeout '{}': {e}", self.timeout))
    }
}

/// Configuration for one routing strategy
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Uniformly random scores; a baseline
    Random(RandomConfig),
    /// Similarity-weighted Elo ranking over historical arena battles
    SwRanking(SwRankingConfig),
    /// Opaque predictor reached over HTTP
    External(ExternalConfig),
}

/// Random baseline strategy; takes no settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomConfig {}

/// Similarity-weighted ranking strategy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwRankingConfig {
    /// Battle datasets (JSON array or JSON lines)
    pub battles: Vec<PathBuf>,
    /// Embedding datasets aligned row-for-row with `battles`
    pub embeddings: Vec<PathBuf>,
    /// Name of the strong model as it appears in the battle data
    #[serde(default = "default_arena_strong")]
    pub strong_model: String,
    /// Name of the weak model as it appears in the battle data
    #[serde(default = "default_arena_weak")]
    pub weak_model: String,
    /// Number of strength tiers models are bucketed into
    #[serde(default = "default_num_tiers")]
    pub num_tiers: NonZeroUsize,
    /// Embedding model passed to the embeddings provider
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Rating optimizer settings
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

/// Rating optimizer settings
///
/// These bound how long an estimation may run; they are not meant to
/// change which model wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Iteration cap before estimation is reported as failed
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Gradient norm below which the fit is considered converged
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Ridge penalty on logit-scale ratings; keeps fully separable
    /// corpora finite. Zero yields the unpenalized likelihood.
    #[serde(default = "default_l2_penalty")]
    pub l2_penalty: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            l2_penalty: default_l2_penalty(),
        }
    }
}

/// Opaque predictor strategy (BERT, causal-LM or matrix-factorization
/// classifiers served out of process)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalConfig {
    /// Endpoint accepting `{"prompt": ...}` and returning `{"score": ...}`
    pub url: Url,
    /// Whether the predictor tolerates concurrent scoring calls
    #[serde(default)]
    pub concurrent: bool,
}

fn default_timeout() -> String {
    "30s".to_owned()
}

fn default_arena_strong() -> String {
    DEFAULT_ARENA_STRONG_MODEL.to_owned()
}

fn default_arena_weak() -> String {
    DEFAULT_ARENA_WEAK_MODEL.to_owned()
}

fn default_num_tiers() -> NonZeroUsize {
    NonZeroUsize::new(10).expect("non-zero literal")
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_iterations() -> usize {
    1000
}

#[allow(clippy::missing_const_for_fn)]
fn default_tolerance() -> f64 {
    1e-6
}

#[allow(clippy::missing_const_for_fn)]
fn default_l2_penalty() -> f64 {
    1e-4
}
