//! Maximum-likelihood Elo ratings from pairwise outcomes
//!
//! Fits a logistic (Bradley–Terry) preference model where model `a` beats
//! model `b` with probability `1 / (1 + 10^(-(r_a - r_b) / 400))`. Ratings
//! are optimized on the natural-logit scale and reported on the Elo scale
//! centered at 1500.

mod bfgs;

use std::collections::HashMap;
use std::f64::consts::LN_10;
use std::time::Instant;

use tandem_config::EstimatorConfig;

use crate::arena::PairwiseOutcome;
use crate::error::RoutingError;

/// Rating every model starts from
pub const BASE_RATING: f64 = 1500.0;
/// Elo points per factor of ten in win odds
pub const RATING_SCALE: f64 = 400.0;

/// Fitted strength of one model
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub model: String,
    pub score: f64,
}

/// Probability that a model rated `rating` beats one rated `opponent`
pub fn win_probability(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10_f64.powf((opponent - rating) / RATING_SCALE))
}

/// Outcome between two players identified by dense index
///
/// `a == b` is allowed: it contributes a constant to the likelihood and
/// nothing to the gradient, which is what same-tier battles need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Battle {
    pub a: usize,
    pub b: usize,
    pub a_won: bool,
}

/// Recomputes ratings from scratch on every call; nothing is cached
#[derive(Debug, Clone)]
pub struct PreferenceRatingEstimator {
    max_iterations: usize,
    tolerance: f64,
    l2_penalty: f64,
}

impl Default for PreferenceRatingEstimator {
    fn default() -> Self {
        Self::new(&EstimatorConfig::default())
    }
}

impl PreferenceRatingEstimator {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            l2_penalty: config.l2_penalty,
        }
    }

    /// Rate every model appearing in `outcomes`
    ///
    /// Ratings come back in order of each model's first appearance.
    /// `weights`, when given, must hold one non-negative weight per
    /// outcome; `None` weighs all outcomes equally.
    ///
    /// The fit is penalized: it minimizes the weighted negative
    /// log-likelihood plus the configured ridge term (`l2_penalty`, 1e-4
    /// by default), which pulls ratings slightly toward [`BASE_RATING`]
    /// and keeps them finite when one model wins every battle. A zero
    /// penalty gives the plain maximum-likelihood fit.
    pub fn estimate(&self, outcomes: &[PairwiseOutcome], weights: Option<&[f64]>) -> Result<Vec<Rating>, RoutingError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut models: Vec<&str> = Vec::new();
        let mut intern = |model| {
            *index.entry(model).or_insert_with(|| {
                models.push(model);
                models.len() - 1
            })
        };

        let battles: Vec<Battle> = outcomes
            .iter()
            .map(|outcome| Battle {
                a: intern(outcome.model_a()),
                b: intern(outcome.model_b()),
                a_won: outcome.a_won(),
            })
            .collect();

        let scores = self.fit(models.len(), &battles, weights)?;

        Ok(models
            .into_iter()
            .zip(scores)
            .map(|(model, score)| Rating {
                model: model.to_owned(),
                score,
            })
            .collect())
    }

    /// Fit Elo-scale ratings for `players` indexed players
    pub(crate) fn fit(&self, players: usize, battles: &[Battle], weights: Option<&[f64]>) -> Result<Vec<f64>, RoutingError> {
        if players == 0 {
            return Ok(Vec::new());
        }

        let weights = normalized_weights(battles.len(), weights)?;
        let l2_penalty = self.l2_penalty;
        let start = Instant::now();

        let minimum = bfgs::minimize(
            |x, grad| negative_log_likelihood(x, grad, battles, &weights, l2_penalty),
            vec![0.0; players],
            self.max_iterations,
            self.tolerance,
        )
        .map_err(|e| RoutingError::EstimationFailure(e.to_string()))?;

        tracing::debug!(
            players,
            battles = battles.len(),
            iterations = minimum.iterations,
            elapsed_ms = start.elapsed().as_millis(),
            "ratings estimated"
        );

        Ok(minimum
            .x
            .into_iter()
            .map(|logit| BASE_RATING + logit * RATING_SCALE / LN_10)
            .collect())
    }
}

/// Weights scaled to sum to one, so the objective is a weighted mean
fn normalized_weights(len: usize, weights: Option<&[f64]>) -> Result<Vec<f64>, RoutingError> {
    let Some(weights) = weights else {
        #[allow(clippy::cast_precision_loss)]
        let uniform = if len == 0 { 0.0 } else { 1.0 / len as f64 };
        return Ok(vec![uniform; len]);
    };

    if weights.len() != len {
        return Err(RoutingError::EstimationFailure(format!(
            "{} weights for {len} outcomes",
            weights.len()
        )));
    }

    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(RoutingError::EstimationFailure(format!("invalid outcome weight {bad}")));
    }

    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return Err(RoutingError::EstimationFailure(
            "outcome weights must have a positive finite sum".to_owned(),
        ));
    }

    Ok(weights.iter().map(|w| w / total).collect())
}

/// Weighted mean negative log-likelihood plus a ridge term, on logit-scale
/// ratings; writes the gradient into `grad`
fn negative_log_likelihood(x: &[f64], grad: &mut [f64], battles: &[Battle], weights: &[f64], l2_penalty: f64) -> f64 {
    grad.iter_mut().zip(x).for_each(|(g, xi)| *g = l2_penalty * xi);
    let mut value = 0.5 * l2_penalty * x.iter().map(|xi| xi * xi).sum::<f64>();

    for (battle, &weight) in battles.iter().zip(weights) {
        if weight == 0.0 {
            continue;
        }

        let margin = x[battle.a] - x[battle.b];
        let p = sigmoid(margin);
        let (loss, slope) = if battle.a_won {
            (softplus(-margin), p - 1.0)
        } else {
            (softplus(margin), p)
        };

        value += weight * loss;
        grad[battle.a] += weight * slope;
        grad[battle.b] -= weight * slope;
    }

    value
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^z) without overflow
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}
