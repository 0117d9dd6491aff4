//! End-to-end experiment runs.
//!
//! A run spawns agents from the configured segments, generates their tasks,
//! and collects one response per task from a [`ChoiceProducer`]. Analysis is
//! a separate step so recorded responses can be re-analysed later.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ExperimentConfig;
use crate::domain::{spawn_agents, Agent, Response, Result, Task};
use crate::estimator::{analyze, EstimationInput};
use crate::obs::{self, RunSpan};
use crate::results::ResultsDocument;
use crate::simulator::{collect_responses, ChoiceProducer, ChoiceSimulator, SimulatedJudge};
use crate::taskgen::generate_tasks;

/// Everything a run produced, ready for analysis or persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub agents: Vec<Agent>,
    pub tasks: Vec<Task>,
    pub responses: Vec<Response>,
}

impl RunOutcome {
    /// Analyse this run's responses under `config`.
    pub fn analyze<R: Rng + ?Sized>(&self, config: &ExperimentConfig, rng: &mut R) -> ResultsDocument {
        let _span = RunSpan::enter(&self.run_id.to_string());
        let input = EstimationInput::new(&config.features, &config.alternatives, &self.responses)
            .with_segments(&config.segments)
            .with_tasks(&self.tasks);
        analyze(&input, &config.estimator, rng)
    }
}

/// Run the experiment with the built-in simulated respondent.
///
/// The simulator gets its own generator seeded from `rng`, so one seed
/// reproduces tasks and responses alike.
pub fn run_experiment<R: Rng + ?Sized>(config: &ExperimentConfig, rng: &mut R) -> Result<RunOutcome> {
    let simulator = ChoiceSimulator::new(config.simulator.clone());
    let mut judge = SimulatedJudge::new(
        simulator,
        ChaCha8Rng::seed_from_u64(rng.gen()),
        config.simulator.include_none,
    );
    run_with_producer(config, &mut judge, rng)
}

/// Run the experiment against any response producer.
pub fn run_with_producer<P, R>(
    config: &ExperimentConfig,
    producer: &mut P,
    rng: &mut R,
) -> Result<RunOutcome>
where
    P: ChoiceProducer + ?Sized,
    R: Rng + ?Sized,
{
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let _span = RunSpan::enter(&run_id.to_string());

    let agents = spawn_agents(&config.segments);
    obs::emit_run_started(&run_id.to_string(), agents.len(), config.alternatives.len());

    let tasks = generate_tasks(&agents, &config.alternatives, &config.tasks, rng);
    let responses = collect_responses(
        producer,
        &agents,
        &config.alternatives,
        &config.features,
        &tasks,
    )?;

    Ok(RunOutcome {
        run_id,
        started_at,
        agents,
        tasks,
        responses,
    })
}
