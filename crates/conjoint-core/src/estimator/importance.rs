//! Reason-code citation frequency.
//!
//! This is how often a feature is *cited* as a reason, scaled so the most
//! cited feature in the scope is 1.0. It is not a causal importance measure
//! and the scale is not comparable across scopes or experiments; use the MNL
//! part-worths for effect sizes.

use std::collections::BTreeMap;

use crate::domain::Response;

/// Citation counts divided by the scope maximum.
///
/// Every key in `feature_keys` gets an entry; codes outside the schema are
/// counted too.
pub fn feature_importance(responses: &[&Response], feature_keys: &[String]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, f64> =
        feature_keys.iter().map(|k| (k.clone(), 0.0)).collect();
    for r in responses {
        for code in &r.reason_codes {
            *counts.entry(code.clone()).or_insert(0.0) += 1.0;
        }
    }
    let max = counts.values().cloned().fold(0.0, f64::max).max(1.0);
    counts.values_mut().for_each(|c| *c /= max);
    counts
}
