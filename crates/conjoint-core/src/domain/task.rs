//! Choice tasks shown to agents.

use serde::{Deserialize, Serialize};

/// One choice-set instance shown to one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// `<agentId>_task_<index>`.
    pub id: String,
    pub agent_id: String,
    /// Alternative ids in display order; always at least two.
    pub shown_alternatives: Vec<String>,
    #[serde(default)]
    pub is_holdout: bool,
    /// Source task id when this task repeats an earlier choice set.
    #[serde(default)]
    pub is_repeat_of: Option<String>,
}

impl Task {
    pub fn is_repeat(&self) -> bool {
        self.is_repeat_of.is_some()
    }
}

/// Build a task id for the `index`-th task of an agent.
pub fn task_id(agent_id: &str, index: usize) -> String {
    format!("{}_task_{}", agent_id, index)
}
