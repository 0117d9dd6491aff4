//! Holdout hit rate and repeat-task consistency.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::mnl::probabilities;
use crate::domain::{Response, Task};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Holdout responses that chose an alternative and could be scored.
    pub holdout_tasks: usize,
    pub holdout_hits: usize,
    /// `None` when no holdout responses were available.
    pub holdout_hit_rate: Option<f64>,
    pub repeat_pairs: usize,
    pub repeat_agreements: usize,
    pub repeat_consistency: Option<f64>,
}

/// Score holdout responses against `beta` and compare repeat answers.
///
/// `design` rows are indexed through `row_of` (alternative id → row). The
/// predicted pick for a holdout is the shown alternative with the highest
/// probability; ties go to the first shown.
pub fn validate(
    tasks: &[Task],
    responses: &[Response],
    beta: &[f64],
    design: &[Vec<f64>],
    row_of: &HashMap<&str, usize>,
) -> ValidationReport {
    let tasks_by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let response_by_task: HashMap<&str, &Response> =
        responses.iter().map(|r| (r.task_id.as_str(), r)).collect();

    let mut report = ValidationReport::default();

    for r in responses {
        let Some(task) = tasks_by_id.get(r.task_id.as_str()) else {
            continue;
        };

        if task.is_holdout {
            if let Some(chosen) = r.chosen.alternative() {
                let rows: Vec<(&str, usize)> = task
                    .shown_alternatives
                    .iter()
                    .filter_map(|id| row_of.get(id.as_str()).map(|&row| (id.as_str(), row)))
                    .collect();
                if rows.is_empty() {
                    continue;
                }
                let idx: Vec<usize> = rows.iter().map(|(_, row)| *row).collect();
                let p = probabilities(beta, design, &idx);
                let mut best = 0;
                for (i, pi) in p.iter().enumerate() {
                    if *pi > p[best] {
                        best = i;
                    }
                }
                report.holdout_tasks += 1;
                if rows[best].0 == chosen {
                    report.holdout_hits += 1;
                }
            }
        }

        if let Some(source_id) = &task.is_repeat_of {
            if let Some(source) = response_by_task.get(source_id.as_str()) {
                report.repeat_pairs += 1;
                if source.chosen == r.chosen {
                    report.repeat_agreements += 1;
                }
            }
        }
    }

    report.holdout_hit_rate = (report.holdout_tasks > 0)
        .then(|| report.holdout_hits as f64 / report.holdout_tasks as f64);
    report.repeat_consistency = (report.repeat_pairs > 0)
        .then(|| report.repeat_agreements as f64 / report.repeat_pairs as f64);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Choice;

    fn task(id: &str, shown: &[&str], holdout: bool, repeat_of: Option<&str>) -> Task {
        Task {
            id: id.to_string(),
            agent_id: "s_1".to_string(),
            shown_alternatives: shown.iter().map(|s| s.to_string()).collect(),
            is_holdout: holdout,
            is_repeat_of: repeat_of.map(str::to_string),
        }
    }

    fn resp(task_id: &str, chosen: &str) -> Response {
        Response::new(task_id, "s_1", Choice::from(chosen.to_string()))
    }

    #[test]
    fn holdout_hits_and_repeat_agreement() {
        let tasks = vec![
            task("t0", &["a", "b"], false, None),
            task("t1", &["b", "a"], true, None),
            task("t2", &["a", "b"], true, None),
            task("t3", &["a", "b"], false, Some("t0")),
        ];
        let responses = vec![resp("t0", "a"), resp("t1", "a"), resp("t2", "b"), resp("t3", "a")];
        let design = vec![vec![1.0], vec![-1.0]];
        let row_of: HashMap<&str, usize> = [("a", 0), ("b", 1)].into_iter().collect();

        let report = validate(&tasks, &responses, &[2.0], &design, &row_of);
        assert_eq!(report.holdout_tasks, 2);
        assert_eq!(report.holdout_hits, 1);
        assert_eq!(report.holdout_hit_rate, Some(0.5));
        assert_eq!(report.repeat_pairs, 1);
        assert_eq!(report.repeat_consistency, Some(1.0));
    }

    #[test]
    fn no_tasks_means_no_rates() {
        let report = validate(&[], &[resp("t0", "a")], &[], &[], &HashMap::new());
        assert_eq!(report.holdout_hit_rate, None);
        assert_eq!(report.repeat_consistency, None);
    }
}
