//! Results estimation pipeline.
//!
//! [`analyze`] turns a completed run's responses into a [`ResultsDocument`].
//! Stages run in dependency order:
//!
//! 1. feature encoding ([`encoding`])
//! 2. choice shares, overall and per segment ([`shares`])
//! 3. reason-code citation frequency ([`importance`])
//! 4. MNL part-worths, overall and per segment ([`mnl`])
//! 5. willingness-to-pay ([`wtp`])
//! 6. choice drivers ([`drivers`])
//! 7. bootstrap share intervals ([`bootstrap`])
//!
//! followed by holdout/repeat validation. Only stage 7 consumes randomness.
//! Thin or empty input never fails: it produces zeros, empty maps or `None`.

pub mod bootstrap;
pub mod drivers;
pub mod encoding;
pub mod forecast;
pub mod importance;
pub mod mnl;
pub mod shares;
pub mod validation;
pub mod wtp;

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{segment_from_agent_id, Alternative, Feature, Response, Segment, Task};
use crate::metrics::METRICS;
use crate::obs;
use crate::results::{ResultsDocument, Scoped};

use bootstrap::{bootstrap_shares, BootstrapConfig};
use drivers::choice_drivers;
use encoding::FeatureEncoder;
use importance::feature_importance;
use mnl::{MnlConfig, MnlFit, Observation};
use shares::{choice_shares, ResponseStats};
use validation::validate;
use wtp::{willingness_to_pay, DEFAULT_PRICE_PATTERN};

/// Which alternatives enter each MNL observation's choice set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceSetBasis {
    /// Every alternative in the experiment, for every observation.
    #[default]
    Universe,
    /// Only the alternatives shown in the response's task; falls back to
    /// the universe when the task is unknown.
    Shown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    pub mnl: MnlConfig,
    pub bootstrap: BootstrapConfig,
    /// Keep holdout responses out of model fitting (needs tasks).
    pub exclude_holdouts: bool,
    pub choice_set: ChoiceSetBasis,
    /// Fit segments and run bootstrap replicates on the rayon pool.
    pub parallel: bool,
    /// Case-insensitive regex identifying the price feature.
    pub price_pattern: String,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            mnl: MnlConfig::default(),
            bootstrap: BootstrapConfig::default(),
            exclude_holdouts: true,
            choice_set: ChoiceSetBasis::Universe,
            parallel: true,
            price_pattern: DEFAULT_PRICE_PATTERN.to_string(),
        }
    }
}

/// Everything the estimator reads. Tasks and segments are optional context.
#[derive(Debug, Clone, Copy)]
pub struct EstimationInput<'a> {
    pub features: &'a [Feature],
    pub alternatives: &'a [Alternative],
    pub segments: &'a [Segment],
    pub tasks: &'a [Task],
    pub responses: &'a [Response],
}

impl<'a> EstimationInput<'a> {
    pub fn new(
        features: &'a [Feature],
        alternatives: &'a [Alternative],
        responses: &'a [Response],
    ) -> Self {
        Self {
            features,
            alternatives,
            segments: &[],
            tasks: &[],
            responses,
        }
    }

    pub fn with_segments(mut self, segments: &'a [Segment]) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_tasks(mut self, tasks: &'a [Task]) -> Self {
        self.tasks = tasks;
        self
    }
}

/// Segment a response belongs to.
///
/// Uses the explicit `segment_id` when present. Otherwise the agent id is
/// matched against known segment ids as `<segment>_<digits>` (longest match
/// wins), and failing that the trailing `_<digits>` is stripped.
pub fn resolve_segment(response: &Response, known: &[Segment]) -> String {
    if let Some(segment) = &response.segment_id {
        return segment.clone();
    }
    known
        .iter()
        .map(|s| s.segment_id.as_str())
        .filter(|s| {
            response
                .agent_id
                .strip_prefix(s)
                .and_then(|rest| rest.strip_prefix('_'))
                .is_some_and(|ord| !ord.is_empty() && ord.bytes().all(|b| b.is_ascii_digit()))
        })
        .max_by_key(|s| s.len())
        .unwrap_or_else(|| segment_from_agent_id(&response.agent_id))
        .to_string()
}

/// Group responses by resolved segment.
pub fn group_by_segment<'a>(
    responses: &'a [Response],
    known: &[Segment],
) -> BTreeMap<String, Vec<&'a Response>> {
    let legacy = responses.iter().filter(|r| r.segment_id.is_none()).count();
    if legacy > 0 {
        obs::emit_legacy_segment_resolution(legacy);
    }
    let mut groups: BTreeMap<String, Vec<&Response>> = BTreeMap::new();
    for r in responses {
        groups.entry(resolve_segment(r, known)).or_default().push(r);
    }
    groups
}

fn fit_scope(
    scope: &str,
    design: &[Vec<f64>],
    observations: &[Observation],
    config: &MnlConfig,
) -> Option<MnlFit> {
    match mnl::fit(design, observations, config) {
        Some(fit) => {
            METRICS.inc_models_fitted();
            obs::emit_model_fitted(scope, fit.observations, fit.log_likelihood);
            Some(fit)
        }
        None => {
            obs::emit_fit_skipped(scope, observations.len(), config.min_observations);
            None
        }
    }
}

fn labelled(labels: &[String], beta: &[f64]) -> BTreeMap<String, f64> {
    labels.iter().cloned().zip(beta.iter().copied()).collect()
}

/// Run the full estimation pipeline.
pub fn analyze<R: Rng + ?Sized>(
    input: &EstimationInput<'_>,
    config: &EstimatorConfig,
    rng: &mut R,
) -> ResultsDocument {
    let started = Instant::now();
    METRICS.inc_analyses();
    obs::emit_analysis_started(input.responses.len(), input.segments.len());

    let alt_ids: Vec<String> = input.alternatives.iter().map(|a| a.id.clone()).collect();
    let feature_keys: Vec<String> = input.features.iter().map(|f| f.key.clone()).collect();

    let encoder = FeatureEncoder::fit(input.features, input.alternatives);
    let design = encoder.encode_all(input.alternatives);
    let labels = encoder.labels();
    let row_of: HashMap<&str, usize> = alt_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let all: Vec<&Response> = input.responses.iter().collect();
    let segments = group_by_segment(input.responses, input.segments);

    let shares = Scoped {
        overall: choice_shares(&all, &alt_ids),
        by_segment: segments
            .iter()
            .map(|(s, rs)| (s.clone(), choice_shares(rs, &alt_ids)))
            .collect(),
    };

    let feature_importance = Scoped {
        overall: feature_importance(&all, &feature_keys),
        by_segment: segments
            .iter()
            .map(|(s, rs)| (s.clone(), feature_importance(rs, &feature_keys)))
            .collect(),
    };

    let tasks_by_id: HashMap<&str, &Task> =
        input.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let universe: Vec<usize> = (0..design.len()).collect();
    let observation_for = |r: &Response| -> Option<Observation> {
        let chosen_row = *row_of.get(r.chosen.alternative()?)?;
        let task = tasks_by_id.get(r.task_id.as_str());
        if config.exclude_holdouts && task.is_some_and(|t| t.is_holdout) {
            return None;
        }
        let rows: Vec<usize> = match (config.choice_set, task) {
            (ChoiceSetBasis::Shown, Some(t)) => t
                .shown_alternatives
                .iter()
                .filter_map(|id| row_of.get(id.as_str()).copied())
                .collect(),
            _ => universe.clone(),
        };
        let chosen = rows.iter().position(|&row| row == chosen_row)?;
        Some(Observation {
            alternatives: rows,
            chosen,
        })
    };

    let overall_obs: Vec<Observation> = input
        .responses
        .iter()
        .filter_map(|r| observation_for(r))
        .collect();
    let overall_beta = fit_scope("overall", &design, &overall_obs, &config.mnl)
        .map(|f| f.beta)
        .unwrap_or_else(|| vec![0.0; encoder.dimension()]);

    let segment_obs: Vec<(String, Vec<Observation>)> = segments
        .iter()
        .map(|(s, rs)| {
            let observations = rs.iter().filter_map(|r| observation_for(*r)).collect();
            (s.clone(), observations)
        })
        .collect();
    let fit_segment = |(segment, observations): &(String, Vec<Observation>)| {
        fit_scope(segment, &design, observations, &config.mnl)
            .map(|f| (segment.clone(), labelled(&labels, &f.beta)))
    };
    let segment_worths: BTreeMap<String, BTreeMap<String, f64>> = if config.parallel {
        segment_obs.par_iter().filter_map(fit_segment).collect()
    } else {
        segment_obs.iter().filter_map(fit_segment).collect()
    };

    let part_worths = Scoped {
        overall: labelled(&labels, &overall_beta),
        by_segment: segment_worths,
    };

    let wtp = willingness_to_pay(
        input.features,
        &part_worths.overall,
        &config.price_pattern,
        |key| encoder.std_of(key),
    );

    let choice_drivers = choice_drivers(input.responses, &alt_ids);

    let share_keys: Vec<String> = shares.overall.keys().cloned().collect();
    let confidence = bootstrap_shares(
        input.responses,
        &share_keys,
        &config.bootstrap,
        config.parallel,
        rng,
    );

    let validation = validate(input.tasks, input.responses, &overall_beta, &design, &row_of);

    let doc = ResultsDocument {
        shares,
        feature_importance,
        part_worths,
        wtp,
        choice_drivers,
        confidence,
        response_stats: ResponseStats::from_responses(input.responses),
        encoding: encoder,
        validation,
    };

    obs::emit_analysis_finished(started.elapsed().as_millis() as u64, doc.wtp.is_some());
    doc
}
