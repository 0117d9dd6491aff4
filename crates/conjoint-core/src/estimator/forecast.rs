//! What-if share prediction for hypothetical concepts.

use std::collections::BTreeMap;

use super::encoding::FeatureEncoder;
use super::mnl::{dot, softmax};
use crate::domain::Alternative;

/// Predicted logit shares of `concepts` under `part_worths`.
///
/// Concepts are encoded with the original experiment's encoder (its means,
/// deviations and category levels), so a fitted model can score options that
/// were never shown. Encoded keys missing from `part_worths` weigh zero.
pub fn simulate_shares(
    encoder: &FeatureEncoder,
    part_worths: &BTreeMap<String, f64>,
    concepts: &[Alternative],
) -> BTreeMap<String, f64> {
    let beta: Vec<f64> = encoder
        .labels()
        .iter()
        .map(|k| part_worths.get(k).copied().unwrap_or(0.0))
        .collect();
    let utilities: Vec<f64> = concepts
        .iter()
        .map(|c| dot(&beta, &encoder.encode(c)))
        .collect();
    concepts
        .iter()
        .zip(softmax(&utilities))
        .map(|(c, p)| (c.id.clone(), p))
        .collect()
}
