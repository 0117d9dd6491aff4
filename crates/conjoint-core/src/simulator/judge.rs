//! Pluggable response producers.
//!
//! The estimator only sees [`Response`] records, so anything able to answer a
//! task (the built-in simulator, a human panel, a language-model judge) plugs
//! in behind [`ChoiceProducer`].

use std::collections::HashMap;

use rand::Rng;

use super::ChoiceSimulator;
use crate::domain::{Agent, Alternative, ConjointError, Feature, Response, Result, Task};
use crate::metrics::METRICS;
use crate::obs;

/// Anything that can answer a choice task.
pub trait ChoiceProducer {
    /// Answer `task` for `agent`, given the shown alternatives in display order.
    fn respond(
        &mut self,
        agent: &Agent,
        task: &Task,
        shown: &[&Alternative],
        schema: &[Feature],
    ) -> Result<Response>;
}

/// The built-in simulator bound to a random source.
pub struct SimulatedJudge<R> {
    simulator: ChoiceSimulator,
    rng: R,
    include_none: bool,
}

impl<R: Rng> SimulatedJudge<R> {
    pub fn new(simulator: ChoiceSimulator, rng: R, include_none: bool) -> Self {
        Self {
            simulator,
            rng,
            include_none,
        }
    }
}

impl<R: Rng> ChoiceProducer for SimulatedJudge<R> {
    fn respond(
        &mut self,
        agent: &Agent,
        task: &Task,
        shown: &[&Alternative],
        schema: &[Feature],
    ) -> Result<Response> {
        let response = self.simulator.respond(
            agent,
            task,
            shown,
            schema,
            self.include_none,
            &mut self.rng,
        );
        METRICS.inc_responses_simulated();
        Ok(response)
    }
}

/// Drive `producer` over every task, one response per task.
///
/// Tasks referencing unknown agents or alternatives are rejected. Responses
/// that come back without a segment id get the agent's.
pub fn collect_responses<P: ChoiceProducer + ?Sized>(
    producer: &mut P,
    agents: &[Agent],
    alternatives: &[Alternative],
    schema: &[Feature],
    tasks: &[Task],
) -> Result<Vec<Response>> {
    let agents_by_id: HashMap<&str, &Agent> = agents.iter().map(|a| (a.id.as_str(), a)).collect();
    let alts_by_id: HashMap<&str, &Alternative> =
        alternatives.iter().map(|a| (a.id.as_str(), a)).collect();

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        let agent = agents_by_id
            .get(task.agent_id.as_str())
            .copied()
            .ok_or_else(|| ConjointError::UnknownAgent(task.agent_id.clone()))?;
        let shown = task
            .shown_alternatives
            .iter()
            .map(|id| {
                alts_by_id
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| ConjointError::UnknownAlternative(id.clone()))
            })
            .collect::<Result<Vec<&Alternative>>>()?;

        let mut response = producer.respond(agent, task, &shown, schema)?;
        if response.segment_id.is_none() {
            response.segment_id = Some(agent.segment_id.clone());
        }
        responses.push(response);
    }

    let none_count = responses.iter().filter(|r| r.chosen.is_none()).count();
    obs::emit_responses_collected(responses.len(), none_count);
    Ok(responses)
}
