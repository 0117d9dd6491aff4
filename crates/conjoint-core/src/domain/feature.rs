//! Feature schema and alternatives.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Default scale for continuous features that omit `min`/`max`.
pub const DEFAULT_CONTINUOUS_MIN: f64 = 0.0;
pub const DEFAULT_CONTINUOUS_MAX: f64 = 100.0;

/// Declared type of a feature, with its type-specific parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    Continuous {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Categorical {
        categories: Vec<String>,
    },
    Binary,
}

/// One attribute in the experiment's feature schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Unique key within the schema; referenced by alternatives and reason codes.
    pub key: String,

    /// Human-readable label.
    pub label: String,

    #[serde(flatten)]
    pub kind: FeatureKind,

    /// Unit of measure (e.g. "USD", "months").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Feature {
    /// Create a continuous feature with an explicit range.
    pub fn continuous(key: &str, label: &str, min: f64, max: f64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FeatureKind::Continuous {
                min: Some(min),
                max: Some(max),
            },
            unit: None,
        }
    }

    /// Create a categorical feature over the given levels.
    pub fn categorical(key: &str, label: &str, categories: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FeatureKind::Categorical {
                categories: categories.iter().map(|c| c.to_string()).collect(),
            },
            unit: None,
        }
    }

    /// Create a binary (present/absent) feature.
    pub fn binary(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FeatureKind::Binary,
            unit: None,
        }
    }

    /// Attach a unit of measure.
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self.kind, FeatureKind::Continuous { .. })
    }

    /// Map a raw value onto a unit scale.
    ///
    /// Continuous values scale linearly over the declared range (default
    /// `[0, 100]`) and are not clamped, so values outside the range keep
    /// their order. Categorical values map by level index over `count - 1`,
    /// binary values to 0 or 1. Missing or unrecognised values map to 0.
    pub fn normalize(&self, value: Option<&FeatureValue>) -> f64 {
        let Some(value) = value else {
            return 0.0;
        };
        match &self.kind {
            FeatureKind::Continuous { min, max } => {
                let lo = min.unwrap_or(DEFAULT_CONTINUOUS_MIN);
                let hi = max.unwrap_or(DEFAULT_CONTINUOUS_MAX);
                let span = hi - lo;
                if span <= 0.0 {
                    return 0.0;
                }
                value
                    .as_f64()
                    .map(|v| (v - lo) / span)
                    .unwrap_or(0.0)
            }
            FeatureKind::Categorical { categories } => {
                let idx = value
                    .as_str()
                    .and_then(|s| categories.iter().position(|c| c == s))
                    .unwrap_or(0);
                idx as f64 / (categories.len().saturating_sub(1)).max(1) as f64
            }
            FeatureKind::Binary => {
                if value.is_truthy() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// A feature value as supplied by an alternative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FeatureValue {
    /// Numeric view; booleans read as 0/1, text is parsed when it looks numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FeatureValue::Bool(b) => *b,
            FeatureValue::Number(n) => *n > 0.0,
            FeatureValue::Text(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        }
    }

    fn matches_kind(&self, kind: &FeatureKind) -> bool {
        match (kind, self) {
            (FeatureKind::Continuous { .. }, FeatureValue::Number(_)) => true,
            (FeatureKind::Categorical { categories }, FeatureValue::Text(s)) => {
                categories.contains(s)
            }
            (FeatureKind::Binary, FeatureValue::Bool(_)) => true,
            (FeatureKind::Binary, FeatureValue::Number(n)) => *n == 0.0 || *n == 1.0,
            _ => false,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

/// A choosable option described by feature values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureValue>,
}

impl Alternative {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            features: BTreeMap::new(),
        }
    }

    /// Set a feature value.
    pub fn with(mut self, key: &str, value: impl Into<FeatureValue>) -> Self {
        self.features.insert(key.to_string(), value.into());
        self
    }

    pub fn value(&self, key: &str) -> Option<&FeatureValue> {
        self.features.get(key)
    }
}

/// Check schema invariants: unique keys, non-empty categories, ordered ranges.
pub fn validate_schema(features: &[Feature]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for feature in features {
        if !seen.insert(feature.key.as_str()) {
            return Err(ValidationError::DuplicateFeature {
                key: feature.key.clone(),
            });
        }
        match &feature.kind {
            FeatureKind::Categorical { categories } if categories.is_empty() => {
                return Err(ValidationError::EmptyCategories {
                    key: feature.key.clone(),
                });
            }
            FeatureKind::Continuous {
                min: Some(min),
                max: Some(max),
            } if min >= max => {
                return Err(ValidationError::InvertedRange {
                    key: feature.key.clone(),
                    min: *min,
                    max: *max,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Check alternatives against the schema: unique ids and type-correct values.
///
/// Features an alternative omits are tolerated; they normalise and encode as 0.
pub fn validate_alternatives(
    features: &[Feature],
    alternatives: &[Alternative],
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for alt in alternatives {
        if !seen.insert(alt.id.as_str()) {
            return Err(ValidationError::DuplicateAlternative { id: alt.id.clone() });
        }
        for feature in features {
            if let Some(value) = alt.value(&feature.key) {
                if !value.matches_kind(&feature.kind) {
                    return Err(ValidationError::ValueTypeMismatch {
                        alternative: alt.id.clone(),
                        feature: feature.key.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
