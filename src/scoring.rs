//! Completion and day score.

use serde::Serialize;

use crate::daily::{DailyInstance, TaskKind};

/// Completion ratio of one task.
///
/// Number tasks with a positive target score `actual / target`, which may
/// exceed 1. Everything else scores 1 or 0 from `completed`. Deleted tasks
/// score 0.
pub fn completion(task: &DailyInstance) -> f64 {
    if task.is_deleted {
        return 0.0;
    }
    match (task.kind, task.target) {
        (TaskKind::Number, Some(target)) if target > 0.0 => task.actual / target,
        _ => {
            if task.completed {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Mean completion over non-deleted tasks; an empty day scores 1.
pub fn day_score(tasks: &[DailyInstance]) -> f64 {
    let active: Vec<&DailyInstance> = tasks.iter().filter(|task| !task.is_deleted).collect();
    if active.is_empty() {
        return 1.0;
    }
    let sum: f64 = active.iter().map(|task| completion(task)).sum();
    sum / active.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub score: f64,
    /// Non-deleted tasks that count toward the score
    pub counted: usize,
    /// Counted tasks at or above full completion
    pub completed: usize,
}

pub fn summarize(tasks: &[DailyInstance]) -> ScoreSummary {
    let counted = tasks.iter().filter(|task| !task.is_deleted).count();
    let completed = tasks
        .iter()
        .filter(|task| !task.is_deleted && completion(task) >= 1.0)
        .count();
    ScoreSummary {
        score: day_score(tasks),
        counted,
        completed,
    }
}
