//! Similarity-weighted ranking
//!
//! At construction the arena corpus is rated once with uniform weights and
//! its models bucketed into tiers. Each battle is then rewritten as a
//! battle between tiers. Per prompt, the tier battles are re-rated with
//! weights favoring the battles whose prompts resemble this one, and the
//! strong model's tier is compared against the weak model's tier.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tandem_config::SwRankingConfig;
use tandem_core::Deadline;
use tandem_telemetry::{Histogram, KeyValue, metrics};

use super::Strategy;
use crate::arena::ArenaCorpus;
use crate::embedder::Embedder;
use crate::error::RoutingError;
use crate::estimator::{Battle, PreferenceRatingEstimator, win_probability};
use crate::similarity::SimilarityIndex;
use crate::tiers::{TierAssignment, assign_tiers};

/// Tier-level battles and what is needed to re-rate them off the async
/// runtime
#[derive(Debug)]
struct TierFit {
    estimator: PreferenceRatingEstimator,
    battles: Vec<Battle>,
    tier_count: usize,
    strong_tier: usize,
    weak_tier: usize,
}

impl TierFit {
    fn strong_win_rate(&self, weights: &[f64]) -> Result<f64, RoutingError> {
        let ratings = self.estimator.fit(self.tier_count, &self.battles, Some(weights))?;
        let (strong, weak) = (ratings[self.strong_tier], ratings[self.weak_tier]);
        Ok(1.0 - win_probability(weak, strong))
    }
}

pub struct SwRankingStrategy {
    name: String,
    embedder: Arc<dyn Embedder>,
    embedding_model: String,
    index: SimilarityIndex,
    tiers: TierAssignment,
    fit: Arc<TierFit>,
    estimation_duration: Histogram<f64>,
}

impl SwRankingStrategy {
    /// Load the configured arena files and build the strategy
    pub fn from_config(name: &str, config: &SwRankingConfig, embedder: Arc<dyn Embedder>) -> Result<Self, RoutingError> {
        let corpus = ArenaCorpus::load(&config.battles, &config.embeddings)?;
        Self::new(name, corpus, config, embedder)
    }

    /// Rate and tier `corpus`; the strong and weak models named in
    /// `config` must both appear in it
    pub fn new(
        name: &str,
        corpus: ArenaCorpus,
        config: &SwRankingConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RoutingError> {
        if corpus.is_empty() {
            return Err(RoutingError::InvalidCorpus(format!(
                "strategy '{name}' has no decisive arena battles"
            )));
        }

        let estimator = PreferenceRatingEstimator::new(&config.estimator);
        let ratings = estimator.estimate(corpus.outcomes(), None)?;
        let tiers = assign_tiers(&ratings, config.num_tiers);

        let tier_of = |model: &str| {
            tiers.tier_of(model).ok_or_else(|| {
                RoutingError::InvalidCorpus(format!("model '{model}' does not appear in the arena battles"))
            })
        };
        let strong_tier = tier_of(&config.strong_model)?;
        let weak_tier = tier_of(&config.weak_model)?;

        let (outcomes, embeddings) = corpus.into_parts();
        let battles = outcomes
            .iter()
            .map(|outcome| {
                Ok(Battle {
                    a: tier_of(outcome.model_a())?,
                    b: tier_of(outcome.model_b())?,
                    a_won: outcome.a_won(),
                })
            })
            .collect::<Result<Vec<_>, RoutingError>>()?;

        let index = SimilarityIndex::new(embeddings)?;

        tracing::info!(
            strategy = name,
            battles = battles.len(),
            models = tiers.len(),
            tiers = tiers.tier_count(),
            strong_tier,
            weak_tier,
            dimension = index.dimension(),
            "similarity-weighted ranking ready"
        );

        if strong_tier == weak_tier {
            tracing::warn!(
                strategy = name,
                tier = strong_tier,
                "strong and weak models share a tier; every prompt will score 0.5"
            );
        }

        let fit = TierFit {
            estimator,
            battles,
            tier_count: tiers.tier_count(),
            strong_tier,
            weak_tier,
        };

        Ok(Self {
            name: name.to_owned(),
            embedder,
            embedding_model: config.embedding_model.clone(),
            index,
            tiers,
            fit: Arc::new(fit),
            estimation_duration: metrics::meter()
                .f64_histogram(metrics::ROUTING_ESTIMATION_DURATION)
                .with_unit("s")
                .with_description("Time spent re-rating tiers for one prompt")
                .build(),
        })
    }

    /// Base tiering computed at construction
    pub const fn tiers(&self) -> &TierAssignment {
        &self.tiers
    }

    /// Score for a prompt whose embedding is already known
    pub async fn score_embedding(&self, embedding: &[f32]) -> Result<f64, RoutingError> {
        let weights = self.index.weights(embedding)?;
        let fit = Arc::clone(&self.fit);
        let start = Instant::now();

        let score = tokio::task::spawn_blocking(move || fit.strong_win_rate(&weights))
            .await
            .map_err(|e| RoutingError::EstimationFailure(format!("estimation task failed: {e}")))??;

        metrics::record_duration(
            &self.estimation_duration,
            start,
            &[KeyValue::new("strategy", self.name.clone())],
        );

        Ok(score)
    }
}

impl std::fmt::Debug for SwRankingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwRankingStrategy")
            .field("name", &self.name)
            .field("embedding_model", &self.embedding_model)
            .field("battles", &self.index.len())
            .field("tiers", &self.tiers.tier_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Strategy for SwRankingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, prompt: &str, deadline: Deadline) -> Result<f64, RoutingError> {
        let embedding = deadline
            .run(self.embedder.embed(prompt, &self.embedding_model))
            .await??;

        self.score_embedding(&embedding).await
    }
}
