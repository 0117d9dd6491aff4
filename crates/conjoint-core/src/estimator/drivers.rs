//! Choice-driver cross-tabulation from reason codes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::Response;

/// Drivers listed per alternative.
pub const TOP_DRIVERS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub feature: String,
    pub count: u64,
    /// `count` over all responses that chose an alternative.
    pub share: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDrivers {
    /// alternative → feature → citations.
    pub alt_feature_counts: BTreeMap<String, BTreeMap<String, u64>>,
    /// Symmetric feature × feature co-citation counts; the diagonal is the
    /// number of responses citing the feature at all.
    pub co_occurrence: BTreeMap<String, BTreeMap<String, u64>>,
    /// `alt_feature_counts` divided by each alternative's own maximum.
    pub heatmap: BTreeMap<String, BTreeMap<String, f64>>,
    pub top_drivers: BTreeMap<String, Vec<Driver>>,
}

/// Tabulate reason codes of responses that chose an alternative.
pub fn choice_drivers(responses: &[Response], alternative_ids: &[String]) -> ChoiceDrivers {
    let mut alt_feature_counts: BTreeMap<String, BTreeMap<String, u64>> = alternative_ids
        .iter()
        .map(|id| (id.clone(), BTreeMap::new()))
        .collect();
    let mut co_occurrence: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    let mut qualifying = 0u64;

    for r in responses {
        let Some(alt) = r.chosen.alternative() else {
            continue;
        };
        qualifying += 1;

        let codes: BTreeSet<&str> = r.reason_codes.iter().map(String::as_str).collect();
        let per_alt = alt_feature_counts.entry(alt.to_string()).or_default();
        for code in &codes {
            *per_alt.entry(code.to_string()).or_insert(0) += 1;
        }
        for a in &codes {
            let row = co_occurrence.entry(a.to_string()).or_default();
            for b in &codes {
                *row.entry(b.to_string()).or_insert(0) += 1;
            }
        }
    }

    let heatmap = alt_feature_counts
        .iter()
        .map(|(alt, counts)| {
            let max = counts.values().copied().max().unwrap_or(0).max(1) as f64;
            let row = counts
                .iter()
                .map(|(f, c)| (f.clone(), *c as f64 / max))
                .collect();
            (alt.clone(), row)
        })
        .collect();

    let denom = qualifying.max(1) as f64;
    let top_drivers = alt_feature_counts
        .iter()
        .map(|(alt, counts)| {
            let mut ranked: Vec<(&String, &u64)> = counts.iter().collect();
            // count desc, then feature key for stable ties
            ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let drivers = ranked
                .into_iter()
                .take(TOP_DRIVERS)
                .map(|(f, c)| Driver {
                    feature: f.clone(),
                    count: *c,
                    share: *c as f64 / denom,
                })
                .collect();
            (alt.clone(), drivers)
        })
        .collect();

    ChoiceDrivers {
        alt_feature_counts,
        co_occurrence,
        heatmap,
        top_drivers,
    }
}
