//! Multinomial-logit part-worth estimation.
//!
//! Maximises the MNL log-likelihood with an L2 penalty by batch gradient
//! ascent:
//!
//! ```text
//! u_j = β · x_j
//! p_j = exp(u_j - max u) / Σ exp(u_k - max u)
//! ∇   = mean over observations of (x_chosen - Σ_j p_j x_j) - λβ
//! β  += η ∇
//! ```
//!
//! Observations that share a choice set are grouped so each iteration
//! evaluates the softmax once per distinct set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Gradient-descent hyperparameters and the minimum-data guard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MnlConfig {
    pub learning_rate: f64,
    pub iterations: usize,
    /// L2 penalty λ.
    pub l2: f64,
    /// Fits with fewer observations are skipped.
    pub min_observations: usize,
}

impl Default for MnlConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            iterations: 400,
            l2: 0.001,
            min_observations: 5,
        }
    }
}

/// One choice: the rows of the design matrix that were on offer and which
/// of them (by position in `alternatives`) was picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub alternatives: Vec<usize>,
    pub chosen: usize,
}

/// A fitted coefficient vector.
#[derive(Debug, Clone, PartialEq)]
pub struct MnlFit {
    pub beta: Vec<f64>,
    pub log_likelihood: f64,
    pub observations: usize,
}

/// Numerically stable softmax; empty in, empty out.
pub fn softmax(utilities: &[f64]) -> Vec<f64> {
    if utilities.is_empty() {
        return Vec::new();
    }
    let max = utilities.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = utilities.iter().map(|u| (u - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Choice probabilities for `rows` under `beta`.
pub fn probabilities(beta: &[f64], design: &[Vec<f64>], rows: &[usize]) -> Vec<f64> {
    let utilities: Vec<f64> = rows.iter().map(|&r| dot(beta, &design[r])).collect();
    softmax(&utilities)
}

/// Observations sharing a choice set, with per-position choice counts.
struct ChoiceSetGroup {
    rows: Vec<usize>,
    counts: Vec<f64>,
    total: f64,
}

fn group_observations(observations: &[Observation]) -> Vec<ChoiceSetGroup> {
    let mut index: HashMap<&[usize], usize> = HashMap::new();
    let mut groups: Vec<ChoiceSetGroup> = Vec::new();
    for obs in observations {
        let g = *index.entry(obs.alternatives.as_slice()).or_insert_with(|| {
            groups.push(ChoiceSetGroup {
                rows: obs.alternatives.clone(),
                counts: vec![0.0; obs.alternatives.len()],
                total: 0.0,
            });
            groups.len() - 1
        });
        groups[g].counts[obs.chosen] += 1.0;
        groups[g].total += 1.0;
    }
    groups
}

/// Fit β over `design` (one encoded row per alternative).
///
/// Returns `None` when there are fewer than `config.min_observations`
/// usable observations; callers report a zero vector in that case.
/// Observations whose `chosen` position is out of range are ignored.
/// Deterministic: identical inputs give bit-identical coefficients.
pub fn fit(design: &[Vec<f64>], observations: &[Observation], config: &MnlConfig) -> Option<MnlFit> {
    let usable: Vec<Observation> = observations
        .iter()
        .filter(|o| o.chosen < o.alternatives.len() && o.alternatives.iter().all(|&r| r < design.len()))
        .cloned()
        .collect();
    if usable.len() < config.min_observations || usable.is_empty() {
        return None;
    }

    let dims = design.first().map(|r| r.len()).unwrap_or(0);
    let n = usable.len() as f64;
    let groups = group_observations(&usable);
    let mut beta = vec![0.0; dims];

    for _ in 0..config.iterations {
        let mut grad = vec![0.0; dims];
        for group in &groups {
            let p = probabilities(&beta, design, &group.rows);
            for (pos, &row) in group.rows.iter().enumerate() {
                // chosen count minus expected count for this row
                let weight = group.counts[pos] - group.total * p[pos];
                for (g, x) in grad.iter_mut().zip(&design[row]) {
                    *g += weight * x;
                }
            }
        }
        for (b, g) in beta.iter_mut().zip(&grad) {
            let step = g / n - config.l2 * *b;
            *b += config.learning_rate * step;
        }
    }

    let log_likelihood = groups
        .iter()
        .map(|group| {
            let p = probabilities(&beta, design, &group.rows);
            group
                .counts
                .iter()
                .zip(&p)
                .map(|(c, p)| c * p.max(f64::MIN_POSITIVE).ln())
                .sum::<f64>()
        })
        .sum();

    Some(MnlFit {
        beta,
        log_likelihood,
        observations: usable.len(),
    })
}
