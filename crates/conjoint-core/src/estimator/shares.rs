//! Choice shares and response statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Response;

/// Fraction of `responses` choosing each bucket.
///
/// Every id in `alternative_ids` gets a bucket (possibly 0.0); "NONE" and any
/// unlisted ids appear only when chosen. The denominator is the number of
/// responses passed in, so per-segment calls normalize within the segment.
pub fn choice_shares(responses: &[&Response], alternative_ids: &[String]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, f64> =
        alternative_ids.iter().map(|id| (id.clone(), 0.0)).collect();
    for r in responses {
        *counts.entry(r.chosen.key().to_string()).or_insert(0.0) += 1.0;
    }
    let total = responses.len().max(1) as f64;
    counts.values_mut().for_each(|c| *c /= total);
    counts
}

/// Aggregate statistics over a response set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStats {
    pub total_responses: usize,
    pub none_count: usize,
    pub none_rate: f64,
    /// Mean over responses that report a confidence; 0 when none do.
    pub avg_confidence: f64,
}

impl ResponseStats {
    pub fn from_responses(responses: &[Response]) -> Self {
        let total = responses.len();
        let none_count = responses.iter().filter(|r| r.chosen.is_none()).count();
        let confidences: Vec<f64> = responses.iter().filter_map(|r| r.confidence).collect();
        let avg_confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };
        Self {
            total_responses: total,
            none_count,
            none_rate: none_count as f64 / total.max(1) as f64,
            avg_confidence,
        }
    }
}
