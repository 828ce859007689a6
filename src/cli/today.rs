//! lifeops today command implementation
//!
//! Opens a day: legacy migration, template derivation, listing and score.

use std::path::PathBuf;

use crate::clock::parse_date;
use crate::daily::{DailyInstance, TaskKind};
use crate::error::Result;
use crate::migrate::MigrationOutcome;
use crate::output::{emit_success, format_ratio, HumanOutput, OutputOptions};
use crate::scoring;

/// Options for `lifeops today`
pub struct TodayOptions {
    pub date: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub fn run(options: TodayOptions) -> Result<()> {
    let date = options.date.as_deref().map(parse_date).transpose()?;
    let tracker = super::open_tracker(options.data_dir)?;

    let report = tracker.open_day(date)?;

    let mut human = HumanOutput::new(format!("lifeops today: {}", report.date));
    human.push_summary("score", format_ratio(report.summary.score));
    human.push_summary(
        "tasks",
        format!("{} ({} complete)", report.summary.counted, report.summary.completed),
    );
    if report.derived > 0 {
        human.push_summary("derived", report.derived.to_string());
    }
    if let MigrationOutcome::Migrated { count } = report.migration {
        human.push_summary("migrated", count.to_string());
    }

    if report.tasks.is_empty() {
        human.push_detail("no tasks for this day; an empty day scores 1");
        human.push_next_step("lifeops task add check --title \"...\"");
        human.push_next_step("lifeops template add check --title \"...\"");
    }
    for task in &report.tasks {
        human.push_detail(describe_task(task));
    }

    emit_success(options.output, "today", &report, Some(&human))
}

/// One-line rendering of a task for human output
pub(crate) fn describe_task(task: &DailyInstance) -> String {
    let origin = if task.is_manual() { "" } else { " [template]" };
    let body = match (task.kind, task.target) {
        (TaskKind::Number, Some(target)) if target > 0.0 => format!(
            "[#] {}: {}/{} ({})",
            task.title,
            task.actual,
            target,
            format_ratio(scoring::completion(task))
        ),
        (TaskKind::Number, _) => format!(
            "[{}] {} (no target, checkbox)",
            if task.completed { "x" } else { " " },
            task.title
        ),
        (TaskKind::Check, _) => format!(
            "[{}] {}",
            if task.completed { "x" } else { " " },
            task.title
        ),
    };
    format!("{body}{origin} <{}>", task.id)
}
