//! Schema-level feature encoding.
//!
//! Continuous features are z-scored with statistics taken across the
//! experiment's alternatives, categorical features are one-hot encoded with
//! one column per level (`featureKey:category`), binary features become 0/1.
//! The fitted encoder is kept in the results document so new concepts can be
//! encoded on the original experiment's scale later.

use serde::{Deserialize, Serialize};

use crate::domain::{Alternative, Feature, FeatureKind};

/// Standard deviations below this are treated as zero variance.
const MIN_STD: f64 = 1e-12;

/// One numeric column of the design matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EncodedColumn {
    #[serde(rename_all = "camelCase")]
    Continuous {
        key: String,
        feature: String,
        mean: f64,
        std: f64,
    },
    #[serde(rename_all = "camelCase")]
    OneHot {
        key: String,
        feature: String,
        category: String,
    },
    #[serde(rename_all = "camelCase")]
    Binary { key: String, feature: String },
}

impl EncodedColumn {
    /// Encoded label (`price`, `tier:pro`, ...).
    pub fn key(&self) -> &str {
        match self {
            EncodedColumn::Continuous { key, .. }
            | EncodedColumn::OneHot { key, .. }
            | EncodedColumn::Binary { key, .. } => key,
        }
    }

    /// Schema feature this column came from.
    pub fn feature(&self) -> &str {
        match self {
            EncodedColumn::Continuous { feature, .. }
            | EncodedColumn::OneHot { feature, .. }
            | EncodedColumn::Binary { feature, .. } => feature,
        }
    }

    fn encode(&self, alt: &Alternative) -> f64 {
        match self {
            EncodedColumn::Continuous {
                feature, mean, std, ..
            } => {
                if *std < MIN_STD {
                    return 0.0;
                }
                // a missing value sits at the mean
                alt.value(feature)
                    .and_then(|v| v.as_f64())
                    .map(|v| (v - mean) / std)
                    .unwrap_or(0.0)
            }
            EncodedColumn::OneHot {
                feature, category, ..
            } => {
                let hit = alt
                    .value(feature)
                    .and_then(|v| v.as_str())
                    .is_some_and(|s| s == category);
                if hit {
                    1.0
                } else {
                    0.0
                }
            }
            EncodedColumn::Binary { feature, .. } => {
                if alt.value(feature).is_some_and(|v| v.is_truthy()) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Encoder fitted to one experiment's schema and alternatives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureEncoder {
    pub columns: Vec<EncodedColumn>,
}

impl FeatureEncoder {
    /// Derive columns and continuous-feature statistics.
    pub fn fit(schema: &[Feature], alternatives: &[Alternative]) -> Self {
        let mut columns = Vec::new();
        for feature in schema {
            match &feature.kind {
                FeatureKind::Continuous { .. } => {
                    let values: Vec<f64> = alternatives
                        .iter()
                        .filter_map(|a| a.value(&feature.key).and_then(|v| v.as_f64()))
                        .collect();
                    let (mean, std) = mean_std(&values);
                    columns.push(EncodedColumn::Continuous {
                        key: feature.key.clone(),
                        feature: feature.key.clone(),
                        mean,
                        std,
                    });
                }
                FeatureKind::Categorical { categories } => {
                    for category in categories {
                        columns.push(EncodedColumn::OneHot {
                            key: format!("{}:{}", feature.key, category),
                            feature: feature.key.clone(),
                            category: category.clone(),
                        });
                    }
                }
                FeatureKind::Binary => columns.push(EncodedColumn::Binary {
                    key: feature.key.clone(),
                    feature: feature.key.clone(),
                }),
            }
        }
        Self { columns }
    }

    pub fn dimension(&self) -> usize {
        self.columns.len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.key().to_string()).collect()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key() == key)
    }

    pub fn encode(&self, alt: &Alternative) -> Vec<f64> {
        self.columns.iter().map(|c| c.encode(alt)).collect()
    }

    /// Encode every alternative, preserving input order.
    pub fn encode_all(&self, alternatives: &[Alternative]) -> Vec<Vec<f64>> {
        alternatives.iter().map(|a| self.encode(a)).collect()
    }

    /// Standard deviation recorded for a continuous feature.
    pub fn std_of(&self, feature_key: &str) -> Option<f64> {
        self.columns.iter().find_map(|c| match c {
            EncodedColumn::Continuous { feature, std, .. } if feature == feature_key => Some(*std),
            _ => None,
        })
    }
}

/// Population mean and standard deviation; `(0, 0)` for an empty slice.
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
