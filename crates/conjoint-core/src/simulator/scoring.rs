//! Feature → utility scoring strategies.
//!
//! The simulator never hard-codes which features matter to which traits; it
//! asks a [`FeatureScorer`]. [`KeywordScoring`] is the stock strategy: a small
//! ordered rule table matched case-insensitively against feature keys, which
//! experiments can replace or extend through configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{Feature, Traits};

/// Maps a normalized feature value and an agent's traits to a utility contribution.
pub trait FeatureScorer: Send + Sync {
    /// Contribution of one feature to an alternative's raw utility.
    fn contribution(&self, feature: &Feature, normalized: f64, traits: &Traits) -> f64;

    /// Short human phrase used in explanations ("lower price").
    fn phrase(&self, feature: &Feature) -> String;
}

/// How a matched rule turns a normalized value into utility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "weighting", rename_all = "snake_case")]
pub enum Weighting {
    /// `(1 - v) * price_sensitivity * scale`: lower is better.
    PriceSensitive { scale: f64 },
    /// `v * (1 - risk_tolerance) * scale`: valued by the risk-averse.
    RiskAverse { scale: f64 },
    /// `v * scale`.
    Flat { scale: f64 },
}

impl Weighting {
    fn apply(&self, v: f64, traits: &Traits) -> f64 {
        match *self {
            Weighting::PriceSensitive { scale } => (1.0 - v) * traits.price_sensitivity * scale,
            Weighting::RiskAverse { scale } => v * (1.0 - traits.risk_tolerance) * scale,
            Weighting::Flat { scale } => v * scale,
        }
    }
}

/// One row of the keyword table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordRule {
    /// Substrings matched case-insensitively against the feature key.
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub weighting: Weighting,
    pub phrase: String,
}

impl KeywordRule {
    pub fn new(keywords: &[&str], weighting: Weighting, phrase: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            weighting,
            phrase: phrase.to_string(),
        }
    }

    fn matches(&self, key_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| key_lower.contains(&k.to_lowercase()))
    }
}

/// Ordered keyword rule table; the first matching rule wins, unmatched
/// features contribute their normalized value unweighted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordScoring {
    pub rules: Vec<KeywordRule>,
}

impl Default for KeywordScoring {
    fn default() -> Self {
        Self::standard()
    }
}

impl KeywordScoring {
    /// Price/cost, warranty/guarantee/support and quality/reliability rules.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(
                    &["price", "cost"],
                    Weighting::PriceSensitive { scale: 2.0 },
                    "lower price",
                ),
                KeywordRule::new(
                    &["warranty", "guarantee", "support"],
                    Weighting::RiskAverse { scale: 1.5 },
                    "stronger coverage",
                ),
                KeywordRule::new(
                    &["quality", "reliability"],
                    Weighting::Flat { scale: 1.5 },
                    "higher quality",
                ),
            ],
        }
    }

    fn rule_for(&self, feature: &Feature) -> Option<&KeywordRule> {
        let key = feature.key.to_lowercase();
        self.rules.iter().find(|r| r.matches(&key))
    }
}

impl FeatureScorer for KeywordScoring {
    fn contribution(&self, feature: &Feature, normalized: f64, traits: &Traits) -> f64 {
        match self.rule_for(feature) {
            Some(rule) => rule.weighting.apply(normalized, traits),
            None => normalized,
        }
    }

    fn phrase(&self, feature: &Feature) -> String {
        match self.rule_for(feature) {
            Some(rule) => rule.phrase.clone(),
            None => feature.label.to_lowercase(),
        }
    }
}
