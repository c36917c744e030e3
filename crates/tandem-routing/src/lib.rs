//! Strong/weak model routing for Tandem
//!
//! A prompt is scored by a named strategy; the score is compared against
//! a client-chosen threshold to pick either the strong or the weak model
//! of the configured pair.
//!
//! - **random**: uniform scores, a baseline
//! - **sw_ranking**: Elo ratings over historical arena battles, re-fit per
//!   prompt with battles weighted by prompt similarity
//! - **external**: scores from an out-of-process predictor

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod arena;
pub mod controller;
mod embedder;
pub mod error;
pub mod estimator;
mod pair;
pub mod similarity;
pub mod strategy;
pub mod tiers;
mod usage;

pub use arena::{ArenaCorpus, BattleRecord, PairwiseOutcome};
pub use controller::{
    MODEL_PREFIX, RoutingController, decode_model_identifier, encode_model_identifier, parse_threshold,
};
pub use embedder::Embedder;
pub use error::RoutingError;
pub use estimator::{PreferenceRatingEstimator, Rating};
pub use pair::ModelPair;
pub use strategy::{Strategy, StrategyRegistry};
pub use tiers::{Tier, TierAssignment, assign_tiers};
pub use usage::UsageCounters;
