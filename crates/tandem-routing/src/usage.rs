//! Per-strategy, per-model routing counters

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// How many decisions each strategy routed to each model
///
/// Safe to update from any number of concurrent requests; increments are
/// never lost.
#[derive(Debug, Default)]
pub struct UsageCounters {
    strategies: DashMap<String, DashMap<String, AtomicU64>>,
}

impl UsageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one decision and return the new total for the pair
    pub fn increment(&self, strategy: &str, model: &str) -> u64 {
        if let Some(models) = self.strategies.get(strategy)
            && let Some(counter) = models.get(model)
        {
            return counter.fetch_add(1, Ordering::Relaxed) + 1;
        }

        self.strategies
            .entry(strategy.to_owned())
            .or_default()
            .entry(model.to_owned())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
            + 1
    }

    /// Current count for one strategy and model
    pub fn get(&self, strategy: &str, model: &str) -> u64 {
        self.strategies
            .get(strategy)
            .and_then(|models| models.get(model).map(|c| c.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    /// Total decisions across every strategy and model
    pub fn total(&self) -> u64 {
        self.strategies
            .iter()
            .flat_map(|models| {
                models
                    .iter()
                    .map(|counter| counter.load(Ordering::Relaxed))
                    .collect::<Vec<_>>()
            })
            .sum()
    }

    /// Point-in-time copy, sorted by strategy then model
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.strategies
            .iter()
            .map(|models| {
                let counts = models
                    .iter()
                    .map(|counter| (counter.key().clone(), counter.load(Ordering::Relaxed)))
                    .collect();
                (models.key().clone(), counts)
            })
            .collect()
    }
}
