use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{responses_digest, Response, Result};
use crate::results::ResultsDocument;

pub const SCHEMA_VERSION: &str = "1.0";

/// Canonical results artifact persisted as results.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub experiment: String,
    /// Run that produced the responses; `None` for imported responses.
    pub run_id: Option<Uuid>,
    /// Digest of the responses `results` was computed from.
    pub responses_digest: String,
    pub results: ResultsDocument,
}

impl ResultsArtifact {
    pub fn new(
        experiment: &str,
        run_id: Option<Uuid>,
        responses: &[Response],
        results: ResultsDocument,
    ) -> Result<Self> {
        Ok(Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            experiment: experiment.to_string(),
            run_id,
            responses_digest: responses_digest(responses)?,
            results,
        })
    }

    /// True when `responses` are exactly the ones these results came from.
    pub fn is_current_for(&self, responses: &[Response]) -> Result<bool> {
        Ok(responses_digest(responses)? == self.responses_digest)
    }
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write results.json in pretty JSON format.
pub fn write_results_json(path: &Path, artifact: &ResultsArtifact) -> Result<()> {
    write_json(path, artifact)
}

pub fn read_results_json(path: &Path) -> Result<ResultsArtifact> {
    read_json(path)
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

/// Render the markdown summary of a results artifact.
pub fn render_summary_md(artifact: &ResultsArtifact) -> String {
    let doc = &artifact.results;
    let stats = &doc.response_stats;
    let mut out = String::new();
    out.push_str(&format!("# Conjoint Summary: {}\n\n", artifact.experiment));
    out.push_str(&format!(
        "- responses: {}\n- none rate: {}\n- average confidence: {:.2}\n\n",
        stats.total_responses,
        pct(stats.none_rate),
        stats.avg_confidence
    ));

    out.push_str("## Choice Shares\n");
    out.push_str("| option | share | interval |\n|---|---|---|\n");
    for (alt, share) in &doc.shares.overall {
        let interval = doc
            .confidence
            .get(alt)
            .map(|ci| format!("{} to {}", pct(ci.lo), pct(ci.hi)))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!("| `{}` | {} | {} |\n", alt, pct(*share), interval));
    }
    out.push('\n');

    out.push_str("## Part-Worths\n");
    if doc.part_worths.overall.values().all(|b| *b == 0.0) {
        out.push_str("- not estimated (too few responses)\n");
    } else {
        for (key, beta) in &doc.part_worths.overall {
            out.push_str(&format!("- `{}`: {:.3}\n", key, beta));
        }
    }
    out.push('\n');

    out.push_str("## Willingness to Pay\n");
    match &doc.wtp {
        Some(wtp) => {
            let unit = wtp.price_unit.as_deref().unwrap_or("price units");
            out.push_str(&format!(
                "In {} per unit, priced off `{}` (std {:.2}).\n",
                unit, wtp.price_feature, wtp.price_std
            ));
            for (key, value) in &wtp.values {
                out.push_str(&format!("- `{}`: {:.2}\n", key, value));
            }
        }
        None => out.push_str("- not available\n"),
    }
    out.push('\n');

    out.push_str("## Top Drivers\n");
    for (alt, drivers) in &doc.choice_drivers.top_drivers {
        if drivers.is_empty() {
            continue;
        }
        let listed: Vec<String> = drivers
            .iter()
            .map(|d| format!("{} ({}, {})", d.feature, d.count, pct(d.share)))
            .collect();
        out.push_str(&format!("- `{}`: {}\n", alt, listed.join(", ")));
    }
    out.push('\n');

    let v = &doc.validation;
    out.push_str("## Validation\n");
    match v.holdout_hit_rate {
        Some(rate) => out.push_str(&format!(
            "- holdout hit rate: {} ({}/{})\n",
            pct(rate),
            v.holdout_hits,
            v.holdout_tasks
        )),
        None => out.push_str("- holdout hit rate: n/a\n"),
    }
    match v.repeat_consistency {
        Some(rate) => out.push_str(&format!(
            "- repeat consistency: {} ({}/{})\n",
            pct(rate),
            v.repeat_agreements,
            v.repeat_pairs
        )),
        None => out.push_str("- repeat consistency: n/a\n"),
    }
    out
}

/// Write summary.md.
pub fn write_summary_md(path: &Path, artifact: &ResultsArtifact) -> Result<()> {
    std::fs::write(path, render_summary_md(artifact))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Choice;
    use crate::estimator::bootstrap::Interval;
    use crate::estimator::drivers::Driver;
    use crate::estimator::wtp::Wtp;
    use std::collections::BTreeMap;

    fn responses() -> Vec<Response> {
        vec![
            Response::new("s_1_task_0", "s_1", Choice::from("a".to_string())),
            Response::new("s_1_task_1", "s_1", Choice::None),
        ]
    }

    fn artifact() -> ResultsArtifact {
        let mut results = ResultsDocument::default();
        results.shares.overall = BTreeMap::from([("NONE".to_string(), 0.25), ("a".to_string(), 0.75)]);
        results.confidence.insert(
            "a".to_string(),
            Interval {
                lo: 0.6,
                hi: 0.9,
                mean: 0.75,
            },
        );
        results.part_worths.overall = BTreeMap::from([("price".to_string(), -1.5), ("wifi".to_string(), 0.75)]);
        results.wtp = Some(Wtp {
            price_feature: "price".to_string(),
            price_unit: Some("USD".to_string()),
            price_std: 50.0,
            values: BTreeMap::from([("wifi".to_string(), 25.0)]),
        });
        results.choice_drivers.top_drivers.insert(
            "a".to_string(),
            vec![Driver {
                feature: "price".to_string(),
                count: 3,
                share: 0.5,
            }],
        );
        results.response_stats.total_responses = 4;
        results.response_stats.none_rate = 0.25;
        results.response_stats.avg_confidence = 0.8;
        results.validation.holdout_tasks = 2;
        results.validation.holdout_hits = 1;
        results.validation.holdout_hit_rate = Some(0.5);

        let mut artifact =
            ResultsArtifact::new("hotel", None, &responses(), results).expect("build artifact");
        artifact.generated_at = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .expect("parse RFC3339")
            .with_timezone(&Utc);
        artifact
    }

    #[test]
    fn results_artifact_has_expected_keys() {
        let raw = serde_json::to_value(artifact()).expect("serialize artifact");
        let obj = raw.as_object().expect("artifact object");
        for key in [
            "schema_version",
            "generated_at",
            "experiment",
            "run_id",
            "responses_digest",
            "results",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(raw["results"]["wtp"]["priceFeature"], "price");
        assert_eq!(raw["results"]["responseStats"]["totalResponses"], 4);
    }

    #[test]
    fn staleness_follows_the_responses() {
        let artifact = artifact();
        assert!(artifact.is_current_for(&responses()).expect("digest"));

        let mut reordered = responses();
        reordered.reverse();
        assert!(artifact.is_current_for(&reordered).expect("digest"));

        let mut changed = responses();
        changed[1].chosen = Choice::from("a".to_string());
        assert!(!artifact.is_current_for(&changed).expect("digest"));
    }

    #[test]
    fn results_json_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.json");
        let artifact = artifact();
        write_results_json(&path, &artifact).expect("write");
        assert_eq!(read_results_json(&path).expect("read"), artifact);
    }

    #[test]
    fn reading_a_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_results_json(&dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(err, crate::domain::ConjointError::Io(_)));
    }

    #[test]
    fn summary_markdown_render_is_stable() {
        let actual = render_summary_md(&artifact());
        let expected = "# Conjoint Summary: hotel\n\n\
- responses: 4\n- none rate: 25.0%\n- average confidence: 0.80\n\n\
## Choice Shares\n| option | share | interval |\n|---|---|---|\n\
| `NONE` | 25.0% | n/a |\n| `a` | 75.0% | 60.0% to 90.0% |\n\n\
## Part-Worths\n- `price`: -1.500\n- `wifi`: 0.750\n\n\
## Willingness to Pay\nIn USD per unit, priced off `price` (std 50.00).\n- `wifi`: 25.00\n\n\
## Top Drivers\n- `a`: price (3, 50.0%)\n\n\
## Validation\n- holdout hit rate: 50.0% (1/2)\n- repeat consistency: n/a\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn summary_flags_missing_estimates() {
        let mut artifact = artifact();
        artifact.results.part_worths.overall = BTreeMap::from([("price".to_string(), 0.0)]);
        artifact.results.wtp = None;
        let md = render_summary_md(&artifact);
        assert!(md.contains("- not estimated (too few responses)\n"));
        assert!(md.contains("## Willingness to Pay\n- not available\n"));
    }
}
