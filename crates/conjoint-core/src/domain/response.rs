//! Recorded choice outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel written in place of an alternative id when the agent opts out.
pub const NONE_CHOICE: &str = "NONE";

/// What an agent picked for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Choice {
    Alternative(String),
    None,
}

impl Choice {
    pub fn is_none(&self) -> bool {
        matches!(self, Choice::None)
    }

    /// The chosen alternative id, if any.
    pub fn alternative(&self) -> Option<&str> {
        match self {
            Choice::Alternative(id) => Some(id),
            Choice::None => None,
        }
    }

    /// Bucket key used in share tables ("NONE" for opt-outs).
    pub fn key(&self) -> &str {
        match self {
            Choice::Alternative(id) => id,
            Choice::None => NONE_CHOICE,
        }
    }
}

impl From<String> for Choice {
    fn from(s: String) -> Self {
        if s == NONE_CHOICE {
            Choice::None
        } else {
            Choice::Alternative(s)
        }
    }
}

impl From<Choice> for String {
    fn from(c: Choice) -> Self {
        match c {
            Choice::Alternative(id) => id,
            Choice::None => NONE_CHOICE.to_string(),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The recorded outcome of a task. One per task, immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub task_id: String,
    pub agent_id: String,

    /// Explicit segment membership. Older producers omit it, in which case
    /// the estimator falls back to parsing `agent_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,

    pub chosen: Choice,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Feature keys cited as reasons for the choice.
    #[serde(default)]
    pub reason_codes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Response {
    /// Minimal response with no confidence, reasons or explanation.
    pub fn new(task_id: &str, agent_id: &str, chosen: Choice) -> Self {
        Self {
            task_id: task_id.to_string(),
            agent_id: agent_id.to_string(),
            segment_id: None,
            chosen,
            confidence: None,
            reason_codes: Vec::new(),
            explanation: None,
        }
    }

    pub fn with_segment(mut self, segment_id: &str) -> Self {
        self.segment_id = Some(segment_id.to_string());
        self
    }

    pub fn with_reasons(mut self, reasons: &[&str]) -> Self {
        self.reason_codes = reasons.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
