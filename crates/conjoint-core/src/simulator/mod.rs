//! Stochastic utility-based choice simulation.
//!
//! A [`ChoiceSimulator`] stands in for a real respondent: it scores each shown
//! alternative from normalized feature values and the agent's traits, adds
//! trait-scaled noise, and picks the best option (or opts out). Anything that
//! produces the same [`Response`] shape can replace it; see [`judge`].

pub mod judge;
pub mod scoring;

use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Agent, Alternative, Choice, Feature, Response, Task};

pub use judge::{collect_responses, ChoiceProducer, SimulatedJudge};
pub use scoring::{FeatureScorer, KeywordRule, KeywordScoring, Weighting};

const NONE_EXPLANATION: &str = "None of the options offered enough value to choose one.";

/// Tunables for the simulated respondent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Noise amplitude is `(1 - consistency) * noise_weight`.
    pub noise_weight: f64,
    /// Opt out when the best raw utility falls below this.
    pub none_threshold: f64,
    pub max_reason_codes: usize,
    /// Offer a "none of these" option on every task.
    pub include_none: bool,
    pub scoring: KeywordScoring,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            noise_weight: 0.5,
            none_threshold: 0.3,
            max_reason_codes: 3,
            include_none: false,
            scoring: KeywordScoring::standard(),
        }
    }
}

/// Utility breakdown for one shown alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAlternative {
    pub alternative_id: String,
    pub raw: f64,
    pub noisy: f64,
    /// Per-feature contributions in schema order.
    pub contributions: Vec<(String, f64)>,
}

/// The simulator's pick for one task, before it is bound to a task id.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub chosen: Choice,
    pub confidence: f64,
    pub reason_codes: Vec<String>,
    pub explanation: String,
    pub scores: Vec<ScoredAlternative>,
}

pub struct ChoiceSimulator {
    noise_weight: f64,
    none_threshold: f64,
    max_reason_codes: usize,
    scorer: Box<dyn FeatureScorer>,
}

impl Default for ChoiceSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl ChoiceSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            noise_weight: config.noise_weight,
            none_threshold: config.none_threshold,
            max_reason_codes: config.max_reason_codes,
            scorer: Box::new(config.scoring),
        }
    }

    /// Swap in a different scoring strategy.
    pub fn with_scorer(mut self, scorer: Box<dyn FeatureScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    fn score<R: Rng + ?Sized>(
        &self,
        agent: &Agent,
        alt: &Alternative,
        schema: &[Feature],
        rng: &mut R,
    ) -> ScoredAlternative {
        let contributions: Vec<(String, f64)> = schema
            .iter()
            .map(|f| {
                let v = f.normalize(alt.value(&f.key));
                (f.key.clone(), self.scorer.contribution(f, v, &agent.traits))
            })
            .collect();
        let raw: f64 = contributions.iter().map(|(_, c)| c).sum();
        let amplitude = (1.0 - agent.traits.consistency) * self.noise_weight;
        let noise = (rng.gen::<f64>() - 0.5) * amplitude;
        ScoredAlternative {
            alternative_id: alt.id.clone(),
            raw,
            noisy: raw + noise,
            contributions,
        }
    }

    /// Pick one of `shown` (or opt out) for `agent`.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        agent: &Agent,
        shown: &[&Alternative],
        schema: &[Feature],
        include_none: bool,
        rng: &mut R,
    ) -> Decision {
        let scores: Vec<ScoredAlternative> = shown
            .iter()
            .map(|alt| self.score(agent, alt, schema, &mut *rng))
            .collect();

        let best = scores
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                a.noisy
                    .partial_cmp(&b.noisy)
                    .unwrap_or(Ordering::Equal)
                    // earliest shown wins ties
                    .then(ib.cmp(ia))
            })
            .map(|(i, _)| i);

        let top_raw = scores
            .iter()
            .map(|s| s.raw)
            .fold(f64::NEG_INFINITY, f64::max);
        let opt_out = include_none && top_raw < self.none_threshold;

        let confidence = confidence_from_gap(&scores);

        let (chosen, reason_codes, explanation) = match best {
            Some(i) if !opt_out => {
                let pick = &scores[i];
                let reasons = self.top_reasons(pick);
                let explanation = self.explain(shown[i], &reasons, schema);
                (
                    Choice::Alternative(pick.alternative_id.clone()),
                    reasons,
                    explanation,
                )
            }
            _ => (Choice::None, Vec::new(), NONE_EXPLANATION.to_string()),
        };

        Decision {
            chosen,
            confidence,
            reason_codes,
            explanation,
            scores,
        }
    }

    /// Run [`choose`](Self::choose) and bind the result to `task`.
    pub fn respond<R: Rng + ?Sized>(
        &self,
        agent: &Agent,
        task: &Task,
        shown: &[&Alternative],
        schema: &[Feature],
        include_none: bool,
        rng: &mut R,
    ) -> Response {
        let decision = self.choose(agent, shown, schema, include_none, rng);
        Response {
            task_id: task.id.clone(),
            agent_id: agent.id.clone(),
            segment_id: Some(agent.segment_id.clone()),
            chosen: decision.chosen,
            confidence: Some(decision.confidence),
            reason_codes: decision.reason_codes,
            explanation: Some(decision.explanation),
        }
    }

    fn top_reasons(&self, pick: &ScoredAlternative) -> Vec<String> {
        let mut positive: Vec<&(String, f64)> =
            pick.contributions.iter().filter(|(_, c)| *c > 0.0).collect();
        positive.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        positive
            .into_iter()
            .take(self.max_reason_codes)
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn explain(&self, alt: &Alternative, reasons: &[String], schema: &[Feature]) -> String {
        let phrase = reasons
            .first()
            .and_then(|key| schema.iter().find(|f| &f.key == key))
            .map(|f| self.scorer.phrase(f));
        match phrase {
            Some(p) => format!("Chose {} mainly for its {}.", alt.name, p),
            None => format!("Chose {} as the best overall option.", alt.name),
        }
    }
}

/// `min(0.5 + (top1 - top2), 0.99)` over noisy scores; 0.8 for a lone
/// alternative, 0.5 when nothing was shown.
fn confidence_from_gap(scores: &[ScoredAlternative]) -> f64 {
    match scores.len() {
        0 => 0.5,
        1 => 0.8,
        _ => {
            let mut noisy: Vec<f64> = scores.iter().map(|s| s.noisy).collect();
            noisy.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
            (0.5 + (noisy[0] - noisy[1])).min(0.99)
        }
    }
}
