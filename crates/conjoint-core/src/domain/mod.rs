//! Domain models for conjoint experiments.
//!
//! Canonical definitions for the core entities:
//! - `Feature` / `Alternative`: the typed schema and the options it describes
//! - `Segment` / `Agent`: simulated respondents and their traits
//! - `Task`: one choice set shown to one agent
//! - `Response`: the recorded outcome of a task

pub mod agent;
pub mod digest;
pub mod error;
pub mod feature;
pub mod response;
pub mod task;

pub use agent::{agent_id, segment_from_agent_id, spawn_agents, Agent, Segment, Traits};
pub use digest::{compute_digest, responses_digest};
pub use error::{ConjointError, Result, ValidationError};
pub use feature::{
    validate_alternatives, validate_schema, Alternative, Feature, FeatureKind, FeatureValue,
};
pub use response::{Choice, Response, NONE_CHOICE};
pub use task::{task_id, Task};
