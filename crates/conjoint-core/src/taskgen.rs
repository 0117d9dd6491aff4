//! Combinatorial choice-task generation.
//!
//! Every agent cycles through the `k`-combinations of the alternative set.
//! A plan of `tasks_per_agent` tasks is split into regular tasks, holdout
//! tasks (reserved for validation) and repeat tasks (re-showing an earlier
//! regular set, for consistency measurement).
//!
//! Holdouts take the last `holdout_count` combinations and regular tasks
//! cycle over the rest, so a holdout never shows a set the model was fitted
//! on. When there are no more combinations than holdouts, nothing can be
//! reserved: regular tasks cycle the whole list and holdouts continue that
//! cycle, reusing training sets.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{task_id, Agent, Alternative, Task};
use crate::metrics::METRICS;
use crate::obs;

/// How many tasks each agent sees and how they are arranged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskPlan {
    /// Alternatives per task (2 = pairwise A/B).
    pub choice_set_size: usize,
    /// Total tasks per agent, holdouts and repeats included.
    pub tasks_per_agent: usize,
    pub holdout_count: usize,
    pub repeat_count: usize,
    /// Shuffle alternative order within each task.
    pub randomize: bool,
    /// Shuffle each agent's task order before ids are assigned.
    pub shuffle_tasks: bool,
}

impl Default for TaskPlan {
    fn default() -> Self {
        Self {
            choice_set_size: 2,
            tasks_per_agent: 10,
            holdout_count: 0,
            repeat_count: 0,
            randomize: true,
            shuffle_tasks: true,
        }
    }
}

impl TaskPlan {
    /// Regular (non-holdout, non-repeat) tasks per agent; never negative.
    pub fn regular_count(&self) -> usize {
        self.tasks_per_agent
            .saturating_sub(self.holdout_count + self.repeat_count)
    }
}

/// All `k`-element combinations of `ids`, in lexicographic index order.
pub fn combinations(ids: &[String], k: usize) -> Vec<Vec<String>> {
    let n = ids.len();
    if k == 0 || k > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| ids[i].clone()).collect());

        // advance the rightmost index that still has room
        let Some(pos) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// Fisher–Yates shuffled copy; the source slice is left untouched.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut copy = items.to_vec();
    copy.shuffle(rng);
    copy
}

struct Draft {
    shown: Vec<String>,
    is_holdout: bool,
    repeat_of: Option<usize>,
}

/// Generate tasks for every agent.
///
/// Returns an empty list when there are fewer alternatives than
/// `plan.choice_set_size`, or when the set size is below 2.
pub fn generate_tasks<R: Rng + ?Sized>(
    agents: &[Agent],
    alternatives: &[Alternative],
    plan: &TaskPlan,
    rng: &mut R,
) -> Vec<Task> {
    if plan.choice_set_size < 2 || alternatives.len() < plan.choice_set_size {
        warn!(
            alternatives = alternatives.len(),
            choice_set_size = plan.choice_set_size,
            "not enough alternatives for the requested choice set size"
        );
        return Vec::new();
    }

    let ids: Vec<String> = alternatives.iter().map(|a| a.id.clone()).collect();
    let combos = combinations(&ids, plan.choice_set_size);

    let mut tasks = Vec::with_capacity(agents.len() * plan.tasks_per_agent);
    for agent in agents {
        tasks.extend(tasks_for_agent(agent, &combos, plan, rng));
    }

    let holdouts = tasks.iter().filter(|t| t.is_holdout).count();
    let repeats = tasks.iter().filter(|t| t.is_repeat()).count();
    METRICS.add_tasks_generated(tasks.len() as u64);
    obs::emit_tasks_generated(tasks.len(), holdouts, repeats);
    tasks
}

fn tasks_for_agent<R: Rng + ?Sized>(
    agent: &Agent,
    combos: &[Vec<String>],
    plan: &TaskPlan,
    rng: &mut R,
) -> Vec<Task> {
    let present = |set: &[String], rng: &mut R| {
        if plan.randomize {
            shuffled(set, rng)
        } else {
            set.to_vec()
        }
    };

    let regular = plan.regular_count();
    let mut drafts: Vec<Draft> = Vec::new();

    let (training, reserved) = if plan.holdout_count < combos.len() {
        combos.split_at(combos.len() - plan.holdout_count)
    } else {
        (combos, combos)
    };

    for i in 0..regular {
        drafts.push(Draft {
            shown: present(&training[i % training.len()], &mut *rng),
            is_holdout: false,
            repeat_of: None,
        });
    }

    // reserved sets start at 0; the shared list continues the regular cycle
    let holdout_offset = if reserved.len() < combos.len() { 0 } else { regular };
    for h in 0..plan.holdout_count {
        drafts.push(Draft {
            shown: present(&reserved[(holdout_offset + h) % reserved.len()], &mut *rng),
            is_holdout: true,
            repeat_of: None,
        });
    }

    // Repeats draw from the regular tasks actually generated; with none
    // available they fall back to whatever exists (holdouts) or are skipped.
    let pool = if regular > 0 { regular } else { drafts.len() };
    if pool > 0 {
        for r in 0..plan.repeat_count {
            let source = r % pool;
            let shown = present(&drafts[source].shown, &mut *rng);
            drafts.push(Draft {
                shown,
                is_holdout: false,
                repeat_of: Some(source),
            });
        }
    } else if plan.repeat_count > 0 {
        warn!(agent_id = %agent.id, "no source tasks to repeat; repeats skipped");
    }

    let mut order: Vec<usize> = (0..drafts.len()).collect();
    if plan.shuffle_tasks {
        order.shuffle(rng);
    }

    let ids: HashMap<usize, String> = order
        .iter()
        .enumerate()
        .map(|(pos, &draft)| (draft, task_id(&agent.id, pos)))
        .collect();

    order
        .iter()
        .map(|&d| {
            let draft = &drafts[d];
            Task {
                id: ids[&d].clone(),
                agent_id: agent.id.clone(),
                shown_alternatives: draft.shown.clone(),
                is_holdout: draft.is_holdout,
                is_repeat_of: draft.repeat_of.map(|src| ids[&src].clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{spawn_agents, Segment, Traits};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn alts(n: usize) -> Vec<Alternative> {
        (0..n)
            .map(|i| Alternative::new(&format!("alt_{}", i), &format!("Alt {}", i)))
            .collect()
    }

    fn agents(n: usize) -> Vec<Agent> {
        spawn_agents(&[Segment::new("seg", n, Traits::default())])
    }

    #[test]
    fn combinations_enumerates_pairs_and_triples() {
        let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(combinations(&ids, 2).len(), 6);
        assert_eq!(combinations(&ids, 3).len(), 4);
        assert_eq!(combinations(&ids, 4), vec![ids.clone()]);
        assert!(combinations(&ids, 5).is_empty());
        assert_eq!(combinations(&ids, 2)[0], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(combinations(&ids, 2)[5], vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn too_few_alternatives_yields_no_tasks() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let plan = TaskPlan {
            choice_set_size: 3,
            ..TaskPlan::default()
        };
        assert!(generate_tasks(&agents(2), &alts(2), &plan, &mut rng).is_empty());
    }

    #[test]
    fn holdout_and_repeat_counts_match_plan() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let plan = TaskPlan {
            choice_set_size: 2,
            tasks_per_agent: 10,
            holdout_count: 2,
            repeat_count: 2,
            ..TaskPlan::default()
        };
        let tasks = generate_tasks(&agents(5), &alts(4), &plan, &mut rng);
        assert_eq!(tasks.len(), 50);
        assert_eq!(tasks.iter().filter(|t| t.is_holdout).count(), 10);
        assert_eq!(tasks.iter().filter(|t| t.is_repeat_of.is_some()).count(), 10);
        assert!(tasks.iter().all(|t| t.shown_alternatives.len() == 2));
    }

    fn sorted_set(task: &Task) -> Vec<String> {
        let mut set = task.shown_alternatives.clone();
        set.sort();
        set
    }

    #[test]
    fn holdouts_show_sets_never_used_for_training() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let plan = TaskPlan {
            tasks_per_agent: 10,
            holdout_count: 2,
            repeat_count: 2,
            ..TaskPlan::default()
        };
        let tasks = generate_tasks(&agents(3), &alts(4), &plan, &mut rng);

        for agent in agents(3) {
            let own: Vec<&Task> = tasks.iter().filter(|t| t.agent_id == agent.id).collect();
            let training: HashSet<Vec<String>> = own
                .iter()
                .filter(|t| !t.is_holdout)
                .map(|t| sorted_set(t))
                .collect();
            let holdout: HashSet<Vec<String>> = own
                .iter()
                .filter(|t| t.is_holdout)
                .map(|t| sorted_set(t))
                .collect();
            assert_eq!(holdout.len(), 2);
            assert_eq!(training.len(), 4);
            assert!(training.is_disjoint(&holdout), "{}: {:?}", agent.id, holdout);
        }
    }

    #[test]
    fn holdouts_reuse_sets_when_none_can_be_reserved() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let plan = TaskPlan {
            tasks_per_agent: 5,
            holdout_count: 3,
            randomize: false,
            shuffle_tasks: false,
            ..TaskPlan::default()
        };
        let tasks = generate_tasks(&agents(1), &alts(3), &plan, &mut rng);
        let pairs = combinations(&alts(3).into_iter().map(|a| a.id).collect::<Vec<_>>(), 2);
        let sets: Vec<Vec<String>> = tasks.iter().map(|t| t.shown_alternatives.clone()).collect();
        // two regular tasks, then holdouts continue the cycle at index 2
        assert_eq!(
            sets,
            vec![
                pairs[0].clone(),
                pairs[1].clone(),
                pairs[2].clone(),
                pairs[0].clone(),
                pairs[1].clone(),
            ]
        );
        assert_eq!(tasks.iter().filter(|t| t.is_holdout).count(), 3);
    }

    #[test]
    fn repeats_reference_existing_tasks_with_same_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let plan = TaskPlan {
            tasks_per_agent: 6,
            holdout_count: 1,
            repeat_count: 2,
            ..TaskPlan::default()
        };
        let tasks = generate_tasks(&agents(3), &alts(3), &plan, &mut rng);
        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

        for task in tasks.iter().filter(|t| t.is_repeat()) {
            let source = by_id[task.is_repeat_of.as_deref().expect("repeat source")];
            assert_eq!(source.agent_id, task.agent_id);
            assert!(!source.is_holdout);
            let mut a = source.shown_alternatives.clone();
            let mut b = task.shown_alternatives.clone();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn ids_follow_agent_task_index_convention() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let plan = TaskPlan {
            tasks_per_agent: 4,
            ..TaskPlan::default()
        };
        let tasks = generate_tasks(&agents(1), &alts(3), &plan, &mut rng);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["seg_1_task_0", "seg_1_task_1", "seg_1_task_2", "seg_1_task_3"]);
    }

    #[test]
    fn no_randomization_keeps_combination_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let plan = TaskPlan {
            tasks_per_agent: 3,
            randomize: false,
            shuffle_tasks: false,
            ..TaskPlan::default()
        };
        let tasks = generate_tasks(&agents(1), &alts(3), &plan, &mut rng);
        let sets: Vec<Vec<String>> = tasks.iter().map(|t| t.shown_alternatives.clone()).collect();
        let ids: Vec<String> = alts(3).into_iter().map(|a| a.id).collect();
        assert_eq!(sets, combinations(&ids, 2));
    }

    #[test]
    fn repeats_survive_zero_regular_tasks() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let plan = TaskPlan {
            tasks_per_agent: 2,
            holdout_count: 2,
            repeat_count: 3,
            ..TaskPlan::default()
        };
        assert_eq!(plan.regular_count(), 0);
        let tasks = generate_tasks(&agents(1), &alts(3), &plan, &mut rng);
        assert_eq!(tasks.iter().filter(|t| t.is_holdout).count(), 2);
        assert_eq!(tasks.iter().filter(|t| t.is_repeat()).count(), 3);

        let none_to_repeat = TaskPlan {
            tasks_per_agent: 0,
            holdout_count: 0,
            repeat_count: 2,
            ..TaskPlan::default()
        };
        assert!(generate_tasks(&agents(1), &alts(3), &none_to_repeat, &mut rng).is_empty());
    }

    #[test]
    fn same_seed_same_tasks() {
        let plan = TaskPlan::default();
        let a = generate_tasks(&agents(2), &alts(4), &plan, &mut ChaCha8Rng::seed_from_u64(42));
        let b = generate_tasks(&agents(2), &alts(4), &plan, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn shuffled_leaves_source_untouched() {
        let src = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = shuffled(&src, &mut rng);
        assert_eq!(src, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, src);
    }
}
