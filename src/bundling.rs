//! Greedy task bundling.
//!
//! Critical and emergency tasks are split off into singleton bundles first.
//! The remaining tasks are sorted by priority and clustered greedily: each
//! unplaced task seeds a bundle, and every later unplaced task joins it when
//! its average compatibility with the current members reaches the merge
//! threshold. Bundle cohesion is reported as the mean pairwise cosine
//! similarity of binary task feature vectors.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::scoring::{Compatibility, Scorer};
use crate::task::{Category, Priority, Severity, Task, time_saved_minutes};

const FEATURE_COUNT: usize = 19;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlingOptions {
    /// Minimum average compatibility for a task to join a forming bundle.
    pub merge_threshold: f64,
    pub scorer: Scorer,
    /// Colors handed to greedy bundles in creation order.
    pub palette: Vec<String>,
    /// Color for critical and emergency singletons.
    pub isolated_color: String,
}

impl Default for BundlingOptions {
    fn default() -> Self {
        Self {
            merge_threshold: 60.0,
            scorer: Scorer::default(),
            palette: ["purple", "blue", "green", "orange", "pink", "teal"]
                .into_iter()
                .map(String::from)
                .collect(),
            isolated_color: "rose".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: String,
    pub tasks: Vec<Task>,
    /// Cohesion percentage, 0 for singletons.
    pub score: u32,
    pub reasons: Vec<String>,
    pub color: String,
}

impl Bundle {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Groups tasks into bundles. Isolated (critical/emergency) bundles come
/// first, followed by greedy bundles in creation order.
pub fn bundle_tasks(tasks: &[Task], options: &BundlingOptions) -> Vec<Bundle> {
    let (isolated, bundleable): (Vec<&Task>, Vec<&Task>) =
        tasks.iter().partition(|task| task.is_unbundleable());

    let mut bundles: Vec<Bundle> = isolated
        .iter()
        .enumerate()
        .map(|(index, task)| Bundle {
            id: format!("bundle-critical-{index}"),
            tasks: vec![(*task).clone()],
            score: 0,
            reasons: vec![isolation_reason(task).to_string()],
            color: options.isolated_color.clone(),
        })
        .collect();

    let matrix = compatibility_matrix(&bundleable, &options.scorer);
    let greedy = greedy_bundles(&bundleable, &matrix, options);
    bundles.extend(greedy);

    info!(
        tasks = tasks.len(),
        isolated = isolated.len(),
        bundles = bundles.len(),
        "bundled task backlog"
    );
    bundles
}

fn isolation_reason(task: &Task) -> &'static str {
    if task.severity == Severity::Critical {
        "Critical priority - cannot bundle"
    } else {
        "Emergency task - cannot bundle"
    }
}

/// `matrix[i][j]` scores task `i` against task `j`; the diagonal is empty.
fn compatibility_matrix(tasks: &[&Task], scorer: &Scorer) -> Vec<Vec<Option<Compatibility>>> {
    tasks
        .par_iter()
        .enumerate()
        .map(|(i, first)| {
            tasks
                .iter()
                .enumerate()
                .map(|(j, second)| (i != j).then(|| scorer.score(first, second)))
                .collect()
        })
        .collect()
}

fn greedy_bundles(
    tasks: &[&Task],
    matrix: &[Vec<Option<Compatibility>>],
    options: &BundlingOptions,
) -> Vec<Bundle> {
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by_key(|&index| {
        std::cmp::Reverse(tasks[index].priority.unwrap_or(Priority::Standard).rank())
    });

    let mut bundled = vec![false; tasks.len()];
    let mut bundles = Vec::new();

    for &seed in &order {
        if bundled[seed] {
            continue;
        }
        bundled[seed] = true;

        let mut members = vec![seed];
        let mut reasons = Vec::new();

        for &candidate in &order {
            if bundled[candidate] {
                continue;
            }
            let scores: Vec<&Compatibility> = members
                .iter()
                .filter_map(|&member| matrix[member][candidate].as_ref())
                .collect();
            if scores.is_empty() {
                continue;
            }

            let average =
                scores.iter().map(|c| c.score as f64).sum::<f64>() / scores.len() as f64;
            if average >= options.merge_threshold {
                debug!(
                    seed = %tasks[seed].id,
                    task = %tasks[candidate].id,
                    average,
                    "task joined bundle"
                );
                reasons = scores[0].reasons.clone();
                members.push(candidate);
                bundled[candidate] = true;
            }
        }

        let members: Vec<Task> = members.iter().map(|&index| tasks[index].clone()).collect();
        let score = if members.len() > 1 {
            cohesion_score(&members)
        } else {
            0
        };
        let color = if options.palette.is_empty() {
            String::new()
        } else {
            options.palette[bundles.len() % options.palette.len()].clone()
        };

        bundles.push(Bundle {
            id: format!("bundle-{}", bundles.len() + 1),
            tasks: members,
            score,
            reasons,
            color,
        });
    }

    bundles
}

/// Binary features: category, priority and severity one-hots followed by
/// presence flags.
pub fn feature_vector(task: &Task) -> [f64; FEATURE_COUNT] {
    let flag = |on: bool| if on { 1.0 } else { 0.0 };
    let location = task.location.as_ref();

    let mut vector = [0.0; FEATURE_COUNT];
    let mut slot = 0;
    for category in Category::ALL {
        vector[slot] = flag(task.category == Some(category));
        slot += 1;
    }
    for priority in Priority::ALL {
        vector[slot] = flag(task.priority == Some(priority));
        slot += 1;
    }
    for severity in Severity::ALL {
        vector[slot] = flag(task.severity == severity);
        slot += 1;
    }
    let presence = [
        location.is_some_and(|loc| loc.region.as_deref().is_some_and(|r| !r.is_empty())),
        location.is_some_and(|loc| loc.building.as_deref().is_some_and(|b| !b.is_empty())),
        task.time_window.is_some(),
        task.company.as_deref().is_some_and(|c| !c.is_empty()),
        task.resources.requires_shutdown,
        task.resources.requires_vendor_access,
    ];
    for on in presence {
        vector[slot] = flag(on);
        slot += 1;
    }
    vector
}

pub fn cosine_similarity(left: &[f64], right: &[f64]) -> f64 {
    if left.len() != right.len() {
        return 0.0;
    }
    let dot: f64 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|a| a * a).sum::<f64>().sqrt();
    let right_norm = right.iter().map(|b| b * b).sum::<f64>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm * right_norm)
}

/// Mean pairwise cosine similarity as a rounded percentage.
pub fn cohesion_score(tasks: &[Task]) -> u32 {
    if tasks.len() < 2 {
        return 0;
    }
    let vectors: Vec<_> = tasks.iter().map(feature_vector).collect();

    let mut total = 0.0;
    let mut pairs = 0;
    for i in 0..vectors.len() {
        for j in i + 1..vectors.len() {
            total += cosine_similarity(&vectors[i], &vectors[j]);
            pairs += 1;
        }
    }
    let average = total / pairs as f64;
    (average * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Headline numbers for a bundle board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummary {
    pub bundles: usize,
    pub tasks: usize,
    pub minutes_saved: u32,
}

impl BundleSummary {
    pub fn from_bundles(bundles: &[Bundle]) -> Self {
        Self {
            bundles: bundles.len(),
            tasks: bundles.iter().map(Bundle::len).sum(),
            minutes_saved: bundles.iter().map(|bundle| time_saved_minutes(&bundle.tasks)).sum(),
        }
    }
}

impl fmt::Display for BundleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |count: usize| if count == 1 { "" } else { "s" };
        write!(
            f,
            "{} bundle{} · {} task{} · ~{} min saved",
            self.bundles,
            plural(self.bundles),
            self.tasks,
            plural(self.tasks),
            self.minutes_saved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medium(id: &str) -> Task {
        Task::new(id, id, Severity::Medium)
            .with_category(Category::Provisioning)
            .with_priority(Priority::Medium)
    }

    #[test]
    fn test_identical_vectors_have_full_similarity() {
        let v = feature_vector(&medium("a"));
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_vector_similarity_is_zero() {
        let zero = [0.0; FEATURE_COUNT];
        let v = feature_vector(&medium("a"));
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cohesion_of_mixed_pair() {
        // Shared: priority + severity (2 of 3 set bits each).
        let a = medium("a");
        let b = Task::new("b", "b", Severity::Medium)
            .with_category(Category::Deployment)
            .with_priority(Priority::Medium);
        assert_eq!(cohesion_score(&[a, b]), 67);
    }

    #[test]
    fn test_feature_vector_layout() {
        let task = Task::new("a", "a", Severity::High)
            .with_category(Category::Emergency)
            .with_priority(Priority::Standard)
            .with_vendor_access();
        let v = feature_vector(&task);
        assert_eq!(v[5], 1.0);
        assert_eq!(v[9], 1.0);
        assert_eq!(v[11], 1.0);
        assert_eq!(v[18], 1.0);
        assert_eq!(v.iter().sum::<f64>(), 4.0);
    }

    #[test]
    fn test_compatible_tasks_share_a_bundle() {
        let tasks = vec![medium("a"), medium("b"), medium("c")];
        let bundles = bundle_tasks(&tasks, &BundlingOptions::default());
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].id, "bundle-1");
        assert_eq!(bundles[0].len(), 3);
        assert_eq!(bundles[0].score, 100);
        assert_eq!(bundles[0].color, "purple");
    }

    #[test]
    fn test_isolated_bundles_come_first() {
        let tasks = vec![
            medium("a"),
            Task::new("crit", "crit", Severity::Critical),
            medium("e").with_category(Category::Emergency),
        ];
        let bundles = bundle_tasks(&tasks, &BundlingOptions::default());
        assert_eq!(bundles[0].id, "bundle-critical-0");
        assert_eq!(bundles[0].reasons, vec!["Critical priority - cannot bundle"]);
        assert_eq!(bundles[1].id, "bundle-critical-1");
        assert_eq!(bundles[1].reasons, vec!["Emergency task - cannot bundle"]);
        assert_eq!(bundles[1].color, "rose");
        assert_eq!(bundles[2].tasks[0].id, "a");
    }

    #[test]
    fn test_higher_priority_seeds_first() {
        let tasks = vec![
            medium("low").with_priority(Priority::Standard).with_shutdown(),
            medium("high").with_priority(Priority::High).with_shutdown(),
        ];
        let options = BundlingOptions {
            merge_threshold: 101.0,
            ..BundlingOptions::default()
        };
        let bundles = bundle_tasks(&tasks, &options);
        assert_eq!(bundles[0].tasks[0].id, "high");
        assert_eq!(bundles[1].tasks[0].id, "low");
        assert_eq!(bundles[1].color, "blue");
        assert_eq!(bundles[1].score, 0);
    }

    #[test]
    fn test_summary_text() {
        let tasks = vec![medium("a"), medium("b")];
        let bundles = bundle_tasks(&tasks, &BundlingOptions::default());
        let summary = BundleSummary::from_bundles(&bundles);
        assert_eq!(summary.to_string(), "1 bundle · 2 tasks · ~25 min saved");
    }
}
