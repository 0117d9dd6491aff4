//! Domain-level error taxonomy for conjoint experiments.
//!
//! Statistical stages never fail on thin data; these errors cover malformed
//! configuration, judge failures and artifact IO.

/// Errors produced by schema and experiment validation.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate feature key: {key}")]
    DuplicateFeature { key: String },

    #[error("categorical feature {key} has no categories")]
    EmptyCategories { key: String },

    #[error("continuous feature {key} has min {min} >= max {max}")]
    InvertedRange { key: String, min: f64, max: f64 },

    #[error("duplicate alternative id: {id}")]
    DuplicateAlternative { id: String },

    #[error("alternative {alternative} value for feature {feature} does not match its type")]
    ValueTypeMismatch { alternative: String, feature: String },

    #[error("segment {segment} trait {name} = {value} is outside [0, 1]")]
    TraitOutOfRange {
        segment: String,
        name: &'static str,
        value: f64,
    },

    #[error("experiment needs at least {needed} alternatives, found {found}")]
    TooFewAlternatives { needed: usize, found: usize },
}

/// Conjoint domain errors.
#[derive(Debug, thiserror::Error)]
pub enum ConjointError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown alternative: {0}")]
    UnknownAlternative(String),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("judge failed on task {task_id}: {reason}")]
    JudgeFailed { task_id: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for conjoint domain operations.
pub type Result<T> = std::result::Result<T, ConjointError>;
