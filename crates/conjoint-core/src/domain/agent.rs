//! Respondent segments and the simulated agents spawned from them.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Behavioural traits shared by every agent in a segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Traits {
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub personality: String,

    /// 0.0–1.0; how strongly price-like features pull utility.
    pub price_sensitivity: f64,

    /// 0.0–1.0; low tolerance makes warranty/support features weigh more.
    pub risk_tolerance: f64,

    /// 0.0–1.0; 1.0 disables choice noise entirely.
    pub consistency: f64,
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            location: String::new(),
            personality: String::new(),
            price_sensitivity: 0.5,
            risk_tolerance: 0.5,
            consistency: 0.8,
        }
    }
}

/// A group of respondents sharing traits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub segment_id: String,
    #[serde(default)]
    pub label: String,
    /// Number of agents to spawn for this segment.
    pub count: usize,
    #[serde(default)]
    pub traits: Traits,
}

impl Segment {
    pub fn new(segment_id: &str, count: usize, traits: Traits) -> Self {
        Self {
            segment_id: segment_id.to_string(),
            label: segment_id.to_string(),
            count,
            traits,
        }
    }

    /// Reject trait values outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("priceSensitivity", self.traits.price_sensitivity),
            ("riskTolerance", self.traits.risk_tolerance),
            ("consistency", self.traits.consistency),
        ];
        for (name, value) in checks {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::TraitOutOfRange {
                    segment: self.segment_id.clone(),
                    name,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// One simulated respondent. Immutable for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub segment_id: String,
    pub traits: Traits,
}

/// Build the agent id for the `ordinal`-th member of a segment.
pub fn agent_id(segment_id: &str, ordinal: usize) -> String {
    format!("{}_{}", segment_id, ordinal)
}

/// Spawn `segment.count` agents per segment, numbered from 1.
pub fn spawn_agents(segments: &[Segment]) -> Vec<Agent> {
    segments
        .iter()
        .flat_map(|seg| {
            (1..=seg.count).map(move |n| Agent {
                id: agent_id(&seg.segment_id, n),
                segment_id: seg.segment_id.clone(),
                traits: seg.traits.clone(),
            })
        })
        .collect()
}

/// Recover a segment id from a `segmentId_<ordinal>` agent id.
///
/// Only strips a trailing all-digit suffix; ids without one are returned
/// whole. Ambiguous when a segment id itself ends in `_<digits>`: `a_1_2`
/// yields `a_1` whether the segment is `a_1` or the agent is the second
/// member of `a_1` under a different convention. Prefer the explicit
/// `segment_id` carried on agents and responses.
pub fn segment_from_agent_id(agent_id: &str) -> &str {
    match agent_id.rsplit_once('_') {
        Some((segment, ordinal))
            if !segment.is_empty()
                && !ordinal.is_empty()
                && ordinal.bytes().all(|b| b.is_ascii_digit()) =>
        {
            segment
        }
        _ => agent_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_agents_derives_ids_from_segment() {
        let segments = vec![
            Segment::new("budget", 2, Traits::default()),
            Segment::new("premium", 1, Traits::default()),
        ];
        let agents = spawn_agents(&segments);
        let ids: Vec<&str> = agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["budget_1", "budget_2", "premium_1"]);
        assert!(agents.iter().all(|a| a.id.starts_with(&a.segment_id)));
    }

    #[test]
    fn segment_parse_strips_numeric_suffix_only() {
        assert_eq!(segment_from_agent_id("budget_12"), "budget");
        assert_eq!(segment_from_agent_id("young_urban_3"), "young_urban");
        assert_eq!(segment_from_agent_id("solo"), "solo");
        assert_eq!(segment_from_agent_id("price_high"), "price_high");
        assert_eq!(segment_from_agent_id("_7"), "_7");
    }

    #[test]
    fn segment_validation_checks_trait_ranges() {
        let mut seg = Segment::new("s", 1, Traits::default());
        assert!(seg.validate().is_ok());
        seg.traits.consistency = 1.5;
        assert!(matches!(
            seg.validate(),
            Err(ValidationError::TraitOutOfRange { name: "consistency", .. })
        ));
    }

    #[test]
    fn traits_deserialize_camel_case() {
        let raw = r#"{"priceSensitivity":1.0,"riskTolerance":0.2,"consistency":0.9}"#;
        let traits: Traits = serde_json::from_str(raw).expect("parse traits");
        assert_eq!(traits.price_sensitivity, 1.0);
        assert!(traits.location.is_empty());
    }
}
