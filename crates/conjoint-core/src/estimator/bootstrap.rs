//! Bootstrap confidence intervals for overall choice shares.
//!
//! The caller's random source only draws one seed per replicate; each
//! replicate then resamples with its own `ChaCha8Rng`. Results are therefore
//! identical whether replicates run sequentially or on the rayon pool.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::Response;
use crate::metrics::METRICS;

/// Percentile interval and mean of the bootstrap share draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of resamples (B).
    pub samples: usize,
    pub lower_quantile: f64,
    pub upper_quantile: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            samples: 200,
            lower_quantile: 0.05,
            upper_quantile: 0.95,
        }
    }
}

/// Resample `responses` with replacement and summarise the share of each
/// bucket in `keys` (alternative ids, plus "NONE" when relevant).
///
/// Empty input or zero samples yields an empty map. Every interval
/// satisfies `lo <= mean <= hi`.
pub fn bootstrap_shares<R: Rng + ?Sized>(
    responses: &[Response],
    keys: &[String],
    config: &BootstrapConfig,
    parallel: bool,
    rng: &mut R,
) -> BTreeMap<String, Interval> {
    if responses.is_empty() || config.samples == 0 || keys.is_empty() {
        return BTreeMap::new();
    }

    let key_index: BTreeMap<&str, usize> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    // bucket per response; unknown ids fall outside every key
    let buckets: Vec<Option<usize>> = responses
        .iter()
        .map(|r| key_index.get(r.chosen.key()).copied())
        .collect();

    let seeds: Vec<u64> = (0..config.samples).map(|_| rng.gen()).collect();
    let replicate = |seed: &u64| resample_shares(&buckets, keys.len(), *seed);
    let draws: Vec<Vec<f64>> = if parallel {
        seeds.par_iter().map(replicate).collect()
    } else {
        seeds.iter().map(replicate).collect()
    };
    METRICS.add_bootstrap_resamples(draws.len() as u64);

    keys.iter()
        .enumerate()
        .map(|(k, key)| {
            let mut column: Vec<f64> = draws.iter().map(|d| d[k]).collect();
            column.sort_by(|a, b| a.total_cmp(b));
            let mean = column.iter().sum::<f64>() / column.len() as f64;
            let lo = quantile(&column, config.lower_quantile);
            let hi = quantile(&column, config.upper_quantile);
            // widen so the interval always contains the mean
            let interval = Interval {
                lo: lo.min(mean),
                hi: hi.max(mean),
                mean,
            };
            (key.clone(), interval)
        })
        .collect()
}

fn resample_shares(buckets: &[Option<usize>], width: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = buckets.len();
    let mut counts = vec![0.0; width];
    for _ in 0..n {
        if let Some(b) = buckets[rng.gen_range(0..n)] {
            counts[b] += 1.0;
        }
    }
    counts.iter().map(|c| c / n.max(1) as f64).collect()
}

/// Nearest-rank quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[pos.min(sorted.len() - 1)]
}
