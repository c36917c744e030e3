//! Routing strategy implementations

pub mod external;
pub mod random;
pub mod sw_ranking;

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tandem_config::{RoutingConfig, StrategyConfig};
use tandem_core::Deadline;

use crate::embedder::Embedder;
use crate::error::RoutingError;
use crate::pair::ModelPair;

pub use external::{ExternalPredictorStrategy, Predictor, RemotePredictor};
pub use random::RandomStrategy;
pub use sw_ranking::SwRankingStrategy;

/// Name the random strategy is registered under when none are configured
pub const DEFAULT_STRATEGY: &str = "random";

/// Scores how much a prompt needs the strong model
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name this strategy was registered under
    fn name(&self) -> &str;

    /// Whether `score` may run for several prompts at once
    fn supports_concurrent_scoring(&self) -> bool {
        true
    }

    /// Strong-preference score in [0, 1]; higher means the strong model
    /// is more likely to be needed
    async fn score(&self, prompt: &str, deadline: Deadline) -> Result<f64, RoutingError>;

    /// Model chosen for `prompt` at `threshold`
    async fn route_model(
        &self,
        prompt: &str,
        threshold: f64,
        pair: &ModelPair,
        deadline: Deadline,
    ) -> Result<String, RoutingError> {
        let score = self.score(prompt, deadline).await?;
        let model = pair.select(score, threshold);

        tracing::debug!(strategy = self.name(), score, threshold, model, "prompt scored");

        Ok(model.to_owned())
    }
}

/// Strategies addressable by name, in registration order
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: IndexMap<String, Box<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured strategy; `random` alone when none are
    ///
    /// Similarity-weighted strategies load their arena corpus and fit base
    /// ratings here, so this can take a while for large corpora.
    pub fn from_config(config: &RoutingConfig, embedder: &Arc<dyn Embedder>) -> Result<Self, RoutingError> {
        let mut registry = Self::new();

        for (name, strategy) in &config.strategies {
            let strategy: Box<dyn Strategy> = match strategy {
                StrategyConfig::Random(_) => Box::new(RandomStrategy::new(name)),
                StrategyConfig::SwRanking(sw) => {
                    Box::new(SwRankingStrategy::from_config(name, sw, Arc::clone(embedder))?)
                }
                StrategyConfig::External(external) => Box::new(ExternalPredictorStrategy::new(
                    name,
                    RemotePredictor::new(external.url.clone()),
                    external.concurrent,
                )),
            };

            tracing::info!(strategy = %name, "registered routing strategy");
            registry.register(name, strategy);
        }

        if registry.is_empty() {
            registry.register(DEFAULT_STRATEGY, Box::new(RandomStrategy::new(DEFAULT_STRATEGY)));
        }

        Ok(registry)
    }

    /// Register a strategy, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, strategy: Box<dyn Strategy>) {
        self.strategies.insert(name.to_owned(), strategy);
    }

    /// Get a strategy by name
    pub fn get(&self, name: &str) -> Option<&dyn Strategy> {
        self.strategies.get(name).map(AsRef::as_ref)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}
