//! Request-facing routing decisions
//!
//! The controller validates what a client asked for, hands the prompt to
//! the named strategy, and counts the outcome. It owns the model pair and
//! the usage counters; strategies only ever see a prompt.

use std::time::{Duration, Instant};

use futures_util::{StreamExt, TryStreamExt, stream};
use tandem_core::Deadline;
use tandem_telemetry::{Counter, Histogram, KeyValue, metrics};

use crate::error::RoutingError;
use crate::pair::ModelPair;
use crate::strategy::{Strategy, StrategyRegistry};
use crate::usage::UsageCounters;

/// Prefix shared by every routed model identifier
pub const MODEL_PREFIX: &str = "router-";

/// Scoring calls kept in flight at once by [`RoutingController::batch_score`]
const BATCH_CONCURRENCY: usize = 16;

/// Split `router-<strategy>-<threshold>` into its parts
///
/// The identifier must split on `-` into exactly three parts, so strategy
/// names cannot contain `-`. Whether the strategy exists is checked when
/// routing.
pub fn decode_model_identifier(model: &str) -> Result<(String, f64), RoutingError> {
    let invalid = || RoutingError::InvalidModelFormat { model: model.to_owned() };

    let parts: Vec<&str> = model.split('-').collect();
    let [prefix, strategy, threshold] = parts.as_slice() else {
        return Err(invalid());
    };
    if *prefix != "router" {
        return Err(invalid());
    }

    Ok(((*strategy).to_owned(), parse_threshold(threshold)?))
}

/// Parse a threshold written as text, e.g. `"0.5"`; must lie in [0, 1]
pub fn parse_threshold(raw: &str) -> Result<f64, RoutingError> {
    let value = raw.parse::<f64>().map_err(|_| RoutingError::InvalidThreshold { value: raw.to_owned() })?;
    validate_threshold(value)?;
    Ok(value)
}

/// Model identifier clients use to reach `strategy` at `threshold`
pub fn encode_model_identifier(strategy: &str, threshold: f64) -> String {
    format!("{MODEL_PREFIX}{strategy}-{threshold}")
}

struct RoutingMetrics {
    decisions: Counter<u64>,
    score_duration: Histogram<f64>,
}

impl RoutingMetrics {
    fn new() -> Self {
        let meter = metrics::meter();
        Self {
            decisions: meter
                .u64_counter(metrics::ROUTING_DECISION_COUNT)
                .with_description("Routing decisions by strategy and chosen model")
                .build(),
            score_duration: meter
                .f64_histogram(metrics::ROUTING_SCORE_DURATION)
                .with_unit("s")
                .with_description("Time to score one prompt")
                .build(),
        }
    }
}

pub struct RoutingController {
    pair: ModelPair,
    strategies: StrategyRegistry,
    usage: UsageCounters,
    timeout: Duration,
    metrics: RoutingMetrics,
}

impl RoutingController {
    /// `timeout` bounds every external call made for one request
    pub fn new(pair: ModelPair, strategies: StrategyRegistry, timeout: Duration) -> Self {
        Self {
            pair,
            strategies,
            usage: UsageCounters::new(),
            timeout,
            metrics: RoutingMetrics::new(),
        }
    }

    pub const fn pair(&self) -> &ModelPair {
        &self.pair
    }

    pub const fn usage(&self) -> &UsageCounters {
        &self.usage
    }

    pub const fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Fresh deadline for one inbound request
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.timeout)
    }

    /// `router-<name>` for every registered strategy, in registration order
    pub fn model_identifiers(&self) -> Vec<String> {
        self.strategies.names().map(|name| format!("{MODEL_PREFIX}{name}")).collect()
    }

    /// See the free function [`decode_model_identifier`]
    pub fn decode_model_identifier(model: &str) -> Result<(String, f64), RoutingError> {
        decode_model_identifier(model)
    }

    /// Work out which strategy and threshold a request asked for
    ///
    /// A `router-` model identifier wins over explicit `router` and
    /// `threshold` fields. Without one, both fields are required.
    /// `threshold` is only read once the strategy is known to exist, so a
    /// bad strategy is reported ahead of a bad threshold.
    pub fn resolve_target(
        &self,
        model: Option<&str>,
        strategy: Option<&str>,
        threshold: impl FnOnce() -> Result<Option<f64>, RoutingError>,
    ) -> Result<(String, f64), RoutingError> {
        if let Some(model) = model.filter(|m| m.starts_with(MODEL_PREFIX)) {
            return decode_model_identifier(model);
        }

        let strategy = strategy.unwrap_or_default();
        self.strategy(strategy)?;

        let threshold = threshold()?.ok_or_else(|| RoutingError::InvalidThreshold {
            value: "none".to_owned(),
        })?;

        Ok((strategy.to_owned(), threshold))
    }

    /// Pick the model that should serve `prompt`
    ///
    /// Fails on an unknown strategy or a threshold outside [0, 1] before
    /// any scoring happens. Exactly one usage count is recorded per
    /// successful call.
    pub async fn route(&self, prompt: &str, strategy: &str, threshold: f64) -> Result<String, RoutingError> {
        self.route_until(prompt, strategy, threshold, self.deadline()).await
    }

    /// [`route`](Self::route) bounded by a caller-supplied deadline
    pub async fn route_until(
        &self,
        prompt: &str,
        strategy: &str,
        threshold: f64,
        deadline: Deadline,
    ) -> Result<String, RoutingError> {
        let router = self.strategy(strategy)?;
        validate_threshold(threshold)?;

        let start = Instant::now();
        let model = router.route_model(prompt, threshold, &self.pair, deadline).await?;

        metrics::record_duration(
            &self.metrics.score_duration,
            start,
            &[KeyValue::new("strategy", strategy.to_owned())],
        );
        self.metrics.decisions.add(
            1,
            &[
                KeyValue::new("strategy", strategy.to_owned()),
                KeyValue::new("model", model.clone()),
            ],
        );
        let count = self.usage.increment(strategy, &model);

        tracing::info!(strategy, threshold, model = %model, count, "routing decision made");

        Ok(model)
    }

    /// Score every prompt with one strategy; scores are index-aligned
    /// with `prompts`
    ///
    /// Strategies that tolerate it are scored concurrently. The first
    /// failure fails the whole batch.
    pub async fn batch_score(&self, prompts: &[String], strategy: &str) -> Result<Vec<f64>, RoutingError> {
        let router = self.strategy(strategy)?;
        if prompts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            strategy,
            prompts = prompts.len(),
            concurrent = router.supports_concurrent_scoring(),
            "batch scoring"
        );

        if router.supports_concurrent_scoring() {
            score_concurrent(router, prompts, self.timeout).await
        } else {
            score_sequential(router, prompts, self.timeout).await
        }
    }

    fn strategy(&self, name: &str) -> Result<&dyn Strategy, RoutingError> {
        if name.is_empty() {
            return Err(self.unknown_strategy(name));
        }
        self.strategies.get(name).ok_or_else(|| self.unknown_strategy(name))
    }

    fn unknown_strategy(&self, name: &str) -> RoutingError {
        RoutingError::InvalidStrategy {
            name: name.to_owned(),
            available: self.strategies.names().collect::<Vec<_>>().join(", "),
        }
    }
}

impl std::fmt::Debug for RoutingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingController")
            .field("pair", &self.pair)
            .field("strategies", &self.strategies)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn validate_threshold(threshold: f64) -> Result<(), RoutingError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(RoutingError::InvalidThreshold {
            value: threshold.to_string(),
        })
    }
}

/// One prompt at a time, each with its own deadline
pub(crate) async fn score_sequential(
    strategy: &dyn Strategy,
    prompts: &[String],
    timeout: Duration,
) -> Result<Vec<f64>, RoutingError> {
    let mut scores = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        scores.push(strategy.score(prompt, Deadline::after(timeout)).await?);
    }
    Ok(scores)
}

/// Up to [`BATCH_CONCURRENCY`] prompts in flight; output order follows input
pub(crate) async fn score_concurrent(
    strategy: &dyn Strategy,
    prompts: &[String],
    timeout: Duration,
) -> Result<Vec<f64>, RoutingError> {
    stream::iter(prompts)
        .map(|prompt| strategy.score(prompt, Deadline::after(timeout)))
        .boxed()
        .buffered(BATCH_CONCURRENCY)
        .try_collect()
        .await
}
