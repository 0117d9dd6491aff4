//! The results document handed back to the surrounding application.
//!
//! Derived only from (responses, alternatives, features, segments, tasks);
//! never edited by hand. Field names are camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::estimator::bootstrap::Interval;
use crate::estimator::drivers::ChoiceDrivers;
use crate::estimator::encoding::FeatureEncoder;
use crate::estimator::shares::ResponseStats;
use crate::estimator::validation::ValidationReport;
use crate::estimator::wtp::Wtp;

/// A value table computed overall and per segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scoped {
    pub overall: BTreeMap<String, f64>,
    pub by_segment: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultsDocument {
    /// alternative id (or "NONE") → fraction of responses.
    pub shares: Scoped,
    /// feature key → citation frequency relative to the scope maximum.
    pub feature_importance: Scoped,
    /// encoded key → MNL coefficient. Segments with too little data are absent.
    pub part_worths: Scoped,
    /// `null` when no price-like feature exists or price has no effect.
    pub wtp: Option<Wtp>,
    pub choice_drivers: ChoiceDrivers,
    /// alternative id (or "NONE") → bootstrap interval of the overall share.
    pub confidence: BTreeMap<String, Interval>,
    pub response_stats: ResponseStats,
    /// Encoder used for part-worths; reuse it to score new concepts.
    pub encoding: FeatureEncoder,
    pub validation: ValidationReport,
}

impl ResultsDocument {
    /// Predicted shares for hypothetical concepts under the overall model.
    pub fn forecast(&self, concepts: &[crate::domain::Alternative]) -> BTreeMap<String, f64> {
        crate::estimator::forecast::simulate_shares(&self.encoding, &self.part_worths.overall, concepts)
    }
}
