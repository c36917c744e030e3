use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Point in time by which an external call must complete
///
/// Created once per inbound request and threaded through every call
/// that crosses the process boundary (embedding lookups, predictor
/// calls, backend completions), so the request as a whole never waits
/// longer than its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

/// The deadline passed before the wrapped call completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    /// Total budget the call was given
    pub budget: Duration,
}

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline of {}ms exceeded", self.budget.as_millis())
    }
}

impl std::error::Error for Elapsed {}

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Time left before the deadline, zero once it has passed
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has already passed
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Drive `future` to completion or fail once the deadline passes
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Elapsed> {
        let budget = self.remaining();
        tokio::time::timeout_at(self.at, future)
            .await
            .map_err(|_| Elapsed { budget })
    }
}
