//! Uniformly random baseline

use async_trait::async_trait;
use rand::Rng;
use tandem_core::Deadline;

use super::Strategy;
use crate::error::RoutingError;

/// Scores every prompt with an independent uniform draw from [0, 1)
///
/// At threshold `t` roughly a `1 - t` share of traffic reaches the strong
/// model, which makes it the reference point other strategies are
/// measured against.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    name: String,
}

impl RandomStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, _prompt: &str, _deadline: Deadline) -> Result<f64, RoutingError> {
        let score: f64 = rand::rng().random();
        Ok(score)
    }
}
