//! Conjoint Core Library
//!
//! Choice-task generation, simulated respondents, and preference estimation
//! (shares, MNL part-worths, willingness-to-pay, bootstrap intervals).

pub mod config;
pub mod domain;
pub mod estimator;
pub mod metrics;
pub mod obs;
pub mod reporting;
pub mod results;
pub mod run;
pub mod simulator;
pub mod taskgen;
pub mod telemetry;

pub use config::ExperimentConfig;

pub use domain::{
    agent_id, compute_digest, responses_digest, segment_from_agent_id, spawn_agents, task_id,
    validate_alternatives, validate_schema, Agent, Alternative, Choice, ConjointError, Feature,
    FeatureKind, FeatureValue, Response, Result, Segment, Task, Traits, ValidationError,
    NONE_CHOICE,
};

pub use estimator::bootstrap::{bootstrap_shares, BootstrapConfig, Interval};
pub use estimator::drivers::{choice_drivers, ChoiceDrivers, Driver};
pub use estimator::encoding::{EncodedColumn, FeatureEncoder};
pub use estimator::forecast::simulate_shares;
pub use estimator::importance::feature_importance;
pub use estimator::mnl::{MnlConfig, MnlFit, Observation};
pub use estimator::shares::{choice_shares, ResponseStats};
pub use estimator::validation::ValidationReport;
pub use estimator::wtp::{detect_price_feature, willingness_to_pay, Wtp};
pub use estimator::{
    analyze, group_by_segment, resolve_segment, ChoiceSetBasis, EstimationInput, EstimatorConfig,
};

pub use results::{ResultsDocument, Scoped};

pub use run::{run_experiment, run_with_producer, RunOutcome};

pub use simulator::{
    collect_responses, ChoiceProducer, ChoiceSimulator, Decision, FeatureScorer, KeywordRule,
    KeywordScoring, SimulatedJudge, SimulatorConfig, Weighting,
};

pub use taskgen::{combinations, generate_tasks, TaskPlan};

pub use reporting::{
    read_json, read_results_json, render_summary_md, write_json, write_results_json,
    write_summary_md, ResultsArtifact, SCHEMA_VERSION,
};

pub use metrics::METRICS;
pub use obs::RunSpan;
pub use telemetry::init_tracing;

/// Conjoint version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
