//! Historical arena battles and their prompt embeddings
//!
//! Battles load from JSON arrays or JSON lines; embeddings from JSON
//! arrays of vectors or comma-separated lines. Row `i` of the embeddings
//! belongs to battle `i` of the raw data, and rows dropped at ingestion
//! (ties, self-battles) drop their embedding with them.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RoutingError;

/// One recorded comparison between two models
///
/// Always decisive and between distinct models; ties never make it past
/// ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseOutcome {
    model_a: String,
    model_b: String,
    a_won: bool,
}

impl PairwiseOutcome {
    /// Build an outcome whose `winner` names one of the two models
    pub fn new(model_a: impl Into<String>, model_b: impl Into<String>, winner: &str) -> Result<Self, RoutingError> {
        let model_a = model_a.into();
        let model_b = model_b.into();

        if model_a == model_b {
            return Err(RoutingError::InvalidCorpus(format!("'{model_a}' cannot battle itself")));
        }

        let a_won = if winner == model_a {
            true
        } else if winner == model_b {
            false
        } else {
            return Err(RoutingError::InvalidCorpus(format!(
                "winner '{winner}' is neither '{model_a}' nor '{model_b}'"
            )));
        };

        Ok(Self { model_a, model_b, a_won })
    }

    pub fn model_a(&self) -> &str {
        &self.model_a
    }

    pub fn model_b(&self) -> &str {
        &self.model_b
    }

    pub fn winner(&self) -> &str {
        if self.a_won { &self.model_a } else { &self.model_b }
    }

    pub const fn a_won(&self) -> bool {
        self.a_won
    }
}

/// Battle row as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct BattleRecord {
    #[serde(alias = "ModelA", alias = "modelA")]
    pub model_a: String,
    #[serde(alias = "ModelB", alias = "modelB")]
    pub model_b: String,
    /// A model name, `model_a`/`model_b`, or a tie label
    #[serde(alias = "Winner")]
    pub winner: String,
}

impl BattleRecord {
    /// Decisive outcome for this row, `None` for ties and self-battles
    fn into_outcome(self) -> Result<Option<PairwiseOutcome>, RoutingError> {
        if self.winner.starts_with("tie") || self.model_a == self.model_b {
            return Ok(None);
        }

        let winner = match self.winner.as_str() {
            "model_a" => self.model_a.clone(),
            "model_b" => self.model_b.clone(),
            _ => self.winner,
        };

        PairwiseOutcome::new(self.model_a, self.model_b, &winner).map(Some)
    }
}

/// Decisive battles with one embedding per battle
#[derive(Debug, Clone, Default)]
pub struct ArenaCorpus {
    outcomes: Vec<PairwiseOutcome>,
    embeddings: Vec<Vec<f32>>,
}

impl ArenaCorpus {
    /// Read every battle and embedding file, in order, and align them
    pub fn load(battle_paths: &[PathBuf], embedding_paths: &[PathBuf]) -> Result<Self, RoutingError> {
        let mut records = Vec::new();
        for path in battle_paths {
            records.extend(parse_battles(&read(path)?, path)?);
        }

        let mut embeddings = Vec::new();
        for path in embedding_paths {
            embeddings.extend(parse_embeddings(&read(path)?, path)?);
        }

        let corpus = Self::from_records(records, embeddings)?;

        tracing::info!(
            battles = corpus.len(),
            files = battle_paths.len(),
            "loaded arena corpus"
        );

        Ok(corpus)
    }

    /// Filter raw rows, dropping the embedding of every dropped battle
    pub fn from_records(records: Vec<BattleRecord>, embeddings: Vec<Vec<f32>>) -> Result<Self, RoutingError> {
        if records.len() != embeddings.len() {
            return Err(RoutingError::InvalidCorpus(format!(
                "{} battles but {} embeddings",
                records.len(),
                embeddings.len()
            )));
        }

        let mut corpus = Self::default();
        let mut dropped = 0_usize;

        for (record, embedding) in records.into_iter().zip(embeddings) {
            match record.into_outcome()? {
                Some(outcome) => {
                    corpus.outcomes.push(outcome);
                    corpus.embeddings.push(embedding);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "discarded ties and self-battles");
        }

        Ok(corpus)
    }

    pub fn outcomes(&self) -> &[PairwiseOutcome] {
        &self.outcomes
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<PairwiseOutcome>, Vec<Vec<f32>>) {
        (self.outcomes, self.embeddings)
    }
}

fn read(path: &Path) -> Result<String, RoutingError> {
    std::fs::read_to_string(path)
        .map_err(|e| RoutingError::InvalidCorpus(format!("failed to read {}: {e}", path.display())))
}

fn parse_battles(raw: &str, path: &Path) -> Result<Vec<BattleRecord>, RoutingError> {
    let invalid = |line: Option<usize>, e: serde_json::Error| {
        let location = line.map_or_else(|| path.display().to_string(), |n| format!("{}:{n}", path.display()));
        RoutingError::InvalidCorpus(format!("malformed battle in {location}: {e}"))
    };

    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).map_err(|e| invalid(None, e));
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| serde_json::from_str(line).map_err(|e| invalid(Some(index + 1), e)))
        .collect()
}

fn parse_embeddings(raw: &str, path: &Path) -> Result<Vec<Vec<f32>>, RoutingError> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).map_err(|e| {
            RoutingError::InvalidCorpus(format!("malformed embeddings in {}: {e}", path.display()))
        });
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.split(',')
                .map(|value| value.trim().parse::<f32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    RoutingError::InvalidCorpus(format!("malformed embedding at {}:{}: {e}", path.display(), index + 1))
                })
        })
        .collect()
}
