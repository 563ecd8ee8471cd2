//! Pairwise compatibility scoring between two tasks.
//!
//! The score is advisory: it is the sum of a handful of fixed rewards,
//! clamped to `0..=100`, together with the human-readable reasons that
//! earned them. The bundling engine decides what threshold to apply.
//!
//! Compatibility is read from the first task's point of view. The category
//! and priority tables are declared per source value, so `score(a, b)` and
//! `score(b, a)` can differ (a monitoring task accepts configuration work,
//! not the other way round).

use serde::{Deserialize, Serialize};

use crate::task::{Category, Priority, Task};

const CATEGORY_POINTS: u32 = 30;
const TIME_OVERLAP_POINTS: u32 = 20;
const TIME_UNKNOWN_POINTS: u32 = 10;
const PRIORITY_POINTS: u32 = 15;
const NO_CONFLICT_POINTS: u32 = 10;
const SAME_CUSTOMER_POINTS: u32 = 10;

/// Score and reasons for one ordered task pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub score: u32,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scorer {
    /// Shared minutes needed before two time windows count as overlapping.
    pub minimum_overlap_minutes: u32,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            minimum_overlap_minutes: 30,
        }
    }
}

impl Scorer {
    pub fn new(minimum_overlap_minutes: u32) -> Self {
        Self {
            minimum_overlap_minutes,
        }
    }

    pub fn score(&self, first: &Task, second: &Task) -> Compatibility {
        let mut score = 0;
        let mut reasons = Vec::new();

        if categories_compatible(first.category, second.category) {
            score += CATEGORY_POINTS;
            reasons.push("Compatible categories".to_string());
        }

        let location = location_points(first, second);
        score += location;
        if location > 0 {
            reasons.push("Compatible locations".to_string());
        }

        match (&first.time_window, &second.time_window) {
            (Some(left), Some(right)) => {
                let overlap = left.overlap_minutes(right);
                if overlap >= self.minimum_overlap_minutes {
                    score += TIME_OVERLAP_POINTS;
                    reasons.push(format!("{overlap}min overlap"));
                }
            }
            _ => score += TIME_UNKNOWN_POINTS,
        }

        if priorities_compatible(first.priority, second.priority) {
            score += PRIORITY_POINTS;
            reasons.push("Compatible priorities".to_string());
        }

        if !has_resource_conflict(first, second) {
            score += NO_CONFLICT_POINTS;
            reasons.push("No conflicts".to_string());
        }

        if let (Some(left), Some(right)) = (&first.company, &second.company)
            && !left.is_empty()
            && left == right
        {
            score += SAME_CUSTOMER_POINTS;
            reasons.push(format!("Same customer ({left})"));
        }

        Compatibility {
            score: score.min(100),
            reasons,
        }
    }
}

/// Categories a task of `category` may share a bundle with.
fn compatible_categories(category: Category) -> &'static [Category] {
    match category {
        Category::Provisioning => &[Category::Provisioning, Category::Deployment],
        Category::AccessControl => &[Category::AccessControl, Category::Configuration],
        Category::Configuration => &[Category::Configuration, Category::AccessControl],
        Category::Deployment => &[Category::Deployment, Category::Provisioning],
        Category::Monitoring => &[Category::Monitoring, Category::Configuration],
        Category::Emergency => &[],
    }
}

fn categories_compatible(first: Option<Category>, second: Option<Category>) -> bool {
    match (first, second) {
        (Some(first), Some(second)) => compatible_categories(first).contains(&second),
        _ => true,
    }
}

/// Priorities a task of `priority` may share a bundle with.
fn compatible_priorities(priority: Priority) -> &'static [Priority] {
    match priority {
        Priority::Critical => &[Priority::Critical],
        Priority::High => &[Priority::High, Priority::Critical],
        Priority::Medium => &[Priority::Medium, Priority::High],
        Priority::Standard => &[Priority::Standard, Priority::Medium],
    }
}

fn priorities_compatible(first: Option<Priority>, second: Option<Priority>) -> bool {
    match (first, second) {
        (Some(first), Some(second)) => compatible_priorities(first).contains(&second),
        _ => true,
    }
}

/// Location never vetoes a pair: remote and admin work has no meaningful
/// distance, so every branch awards points.
fn location_points(first: &Task, second: &Task) -> u32 {
    let (Some(left), Some(right)) = (&first.location, &second.location) else {
        return 20;
    };

    if present(&left.region) && present(&right.region) {
        return 25;
    }
    if present(&left.building) && left.building == right.building {
        return 20;
    }
    15
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.is_empty())
}

fn has_resource_conflict(first: &Task, second: &Task) -> bool {
    let (left, right) = (&first.resources, &second.resources);
    (left.requires_shutdown && right.requires_shutdown)
        || (left.requires_vendor_access && right.requires_vendor_access)
}
