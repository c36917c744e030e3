//! Prompt-to-corpus similarity and the outcome weights derived from it

use crate::error::RoutingError;

/// Cosine similarity of two equal-length vectors; 0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Per-outcome weights from per-outcome similarities
///
/// `weight_i = 10^(10 * sim_i / max_sim)`, so the most similar outcomes
/// dominate by up to ten orders of magnitude. When no similarity is
/// positive the ratio is meaningless and every outcome weighs the same.
/// Non-finite similarities get weight zero.
pub fn similarity_weights(similarities: &[f64]) -> Vec<f64> {
    let max = similarities
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    if !(max > 0.0) {
        return similarities
            .iter()
            .map(|s| if s.is_finite() { 1.0 } else { 0.0 })
            .collect();
    }

    similarities
        .iter()
        .map(|&s| {
            if s.is_finite() {
                10_f64.powf(10.0 * s / max)
            } else {
                0.0
            }
        })
        .collect()
}

/// Arena embeddings queried by cosine similarity
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    rows: Vec<Vec<f32>>,
    dimension: usize,
}

impl SimilarityIndex {
    /// Index embeddings that all share one dimension
    pub fn new(rows: Vec<Vec<f32>>) -> Result<Self, RoutingError> {
        let dimension = rows.first().map_or(0, Vec::len);

        if let Some((row, embedding)) = rows.iter().enumerate().find(|(_, e)| e.len() != dimension) {
            return Err(RoutingError::InvalidCorpus(format!(
                "embedding {row} has dimension {} but the first has {dimension}",
                embedding.len()
            )));
        }

        Ok(Self { rows, dimension })
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Similarity of `query` to every indexed embedding, in corpus order
    pub fn similarities(&self, query: &[f32]) -> Result<Vec<f64>, RoutingError> {
        if !self.rows.is_empty() && query.len() != self.dimension {
            return Err(RoutingError::upstream(format!(
                "prompt embedding has dimension {} but the arena corpus uses {}",
                query.len(),
                self.dimension
            )));
        }

        Ok(self.rows.iter().map(|row| cosine_similarity(query, row)).collect())
    }

    /// Outcome weights for `query`, index-aligned with the corpus
    pub fn weights(&self, query: &[f32]) -> Result<Vec<f64>, RoutingError> {
        self.similarities(query).map(|sims| similarity_weights(&sims))
    }
}
