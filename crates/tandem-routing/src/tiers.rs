//! Bucketing rated models into strength tiers

use std::collections::HashMap;
use std::num::NonZeroUsize;

use crate::estimator::Rating;

/// A model's position in the tiering; tier 0 is the strongest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub model: String,
    pub index: usize,
}

/// Models in descending rating order with their tier indices
#[derive(Debug, Clone, Default)]
pub struct TierAssignment {
    ranked: Vec<Tier>,
    positions: HashMap<String, usize>,
    tier_count: usize,
}

impl TierAssignment {
    /// Tier index of `model`, if it was rated
    pub fn tier_of(&self, model: &str) -> Option<usize> {
        self.positions.get(model).map(|&rank| self.ranked[rank].index)
    }

    /// Number of non-empty tiers
    pub const fn tier_count(&self) -> usize {
        self.tier_count
    }

    /// Every model from highest to lowest rated
    pub fn ranked(&self) -> &[Tier] {
        &self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Sort by rating and split into `num_tiers` equal-width buckets
///
/// Each tier holds `ceil(models / num_tiers)` models, so trailing tiers
/// may be short or absent. Equal ratings keep their input order, making
/// the result deterministic for a given rating list.
pub fn assign_tiers(ratings: &[Rating], num_tiers: NonZeroUsize) -> TierAssignment {
    let mut order: Vec<usize> = (0..ratings.len()).collect();
    order.sort_by(|&i, &j| ratings[j].score.total_cmp(&ratings[i].score));

    let tier_size = ratings.len().div_ceil(num_tiers.get()).max(1);

    let ranked: Vec<Tier> = order
        .into_iter()
        .enumerate()
        .map(|(rank, i)| Tier {
            model: ratings[i].model.clone(),
            index: rank / tier_size,
        })
        .collect();

    let positions = ranked
        .iter()
        .enumerate()
        .map(|(rank, tier)| (tier.model.clone(), rank))
        .collect();

    let tier_count = ranked.last().map_or(0, |tier| tier.index + 1);

    TierAssignment {
        ranked,
        positions,
        tier_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(scores: &[(&str, f64)]) -> Vec<Rating> {
        scores
            .iter()
            .map(|&(model, score)| Rating {
                model: model.to_owned(),
                score,
            })
            .collect()
    }

    fn tiers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn four_models_two_tiers() {
        let ratings = ratings(&[("m1", 1800.0), ("m2", 1600.0), ("m3", 1400.0), ("m4", 1200.0)]);

        let assignment = assign_tiers(&ratings, tiers(2));

        assert_eq!(assignment.tier_of("m1"), Some(0));
        assert_eq!(assignment.tier_of("m2"), Some(0));
        assert_eq!(assignment.tier_of("m3"), Some(1));
        assert_eq!(assignment.tier_of("m4"), Some(1));
        assert_eq!(assignment.tier_count(), 2);
    }

    #[test]
    fn input_order_does_not_matter_for_distinct_ratings() {
        let ratings = ratings(&[("low", 1200.0), ("high", 1800.0), ("mid", 1500.0)]);

        let assignment = assign_tiers(&ratings, tiers(3));

        let ranked: Vec<_> = assignment.ranked().iter().map(|t| (t.model.as_str(), t.index)).collect();
        assert_eq!(ranked, [("high", 0), ("mid", 1), ("low", 2)]);
    }

    #[test]
    fn ties_keep_input_order() {
        let ratings = ratings(&[("b", 1500.0), ("a", 1500.0), ("c", 1500.0)]);

        let assignment = assign_tiers(&ratings, tiers(3));

        assert_eq!(assignment.tier_of("b"), Some(0));
        assert_eq!(assignment.tier_of("a"), Some(1));
        assert_eq!(assignment.tier_of("c"), Some(2));
    }

    #[test]
    fn uneven_split_leaves_short_last_tier() {
        let ratings = ratings(&[("a", 5.0), ("b", 4.0), ("c", 3.0), ("d", 2.0), ("e", 1.0)]);

        let assignment = assign_tiers(&ratings, tiers(2));

        assert_eq!(assignment.tier_of("c"), Some(0));
        assert_eq!(assignment.tier_of("d"), Some(1));
        assert_eq!(assignment.tier_count(), 2);
    }

    #[test]
    fn more_tiers_than_models() {
        let ratings = ratings(&[("a", 2.0), ("b", 1.0)]);

        let assignment = assign_tiers(&ratings, tiers(10));

        assert_eq!(assignment.tier_of("a"), Some(0));
        assert_eq!(assignment.tier_of("b"), Some(1));
        assert_eq!(assignment.tier_count(), 2);
        assert_eq!(assignment.tier_of("unknown"), None);
    }

    #[test]
    fn empty_ratings() {
        let assignment = assign_tiers(&[], tiers(4));
        assert!(assignment.is_empty());
        assert_eq!(assignment.tier_count(), 0);
    }
}
