//! lifeops task command implementation
//!
//! Manual tasks and field patches on dated instances.

use std::path::PathBuf;

use crate::clock::{parse_date, Clock};
use crate::daily::{DailyPatch, TaskKind};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::today::describe_task;

/// Options for `lifeops task add`
pub struct AddOptions {
    pub kind: String,
    pub title: Option<String>,
    pub target: Option<f64>,
    pub date: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

/// Options for `lifeops task set`
pub struct SetOptions {
    pub id: String,
    pub title: Option<String>,
    pub target: Option<Option<f64>>,
    pub actual: Option<f64>,
    pub completed: Option<bool>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

/// Options for `lifeops task rm`
pub struct RmOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

fn non_blank_title(title: Option<String>) -> Result<Option<String>> {
    match title {
        Some(title) if title.trim().is_empty() => Err(Error::InvalidArgument(
            "title cannot be empty".to_string(),
        )),
        other => Ok(other),
    }
}

fn finite(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(n) if !n.is_finite() => Err(Error::InvalidArgument(format!(
            "{field} must be a finite number"
        ))),
        other => Ok(other),
    }
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let kind: TaskKind = options.kind.parse()?;
    let title = non_blank_title(options.title)?;
    let target = finite("target", options.target)?;
    let date = options.date.as_deref().map(parse_date).transpose()?;

    let tracker = super::open_tracker(options.data_dir)?;
    let date = date.unwrap_or_else(|| tracker.clock().today());
    let daily = tracker.daily();

    let patch = DailyPatch {
        title,
        target: target.map(Some),
        ..DailyPatch::default()
    };
    let task = daily.create_manual(kind, date, &patch)?;

    let mut human = HumanOutput::new(format!("lifeops task add: {}", task.title));
    human.push_summary("id", task.id.clone());
    human.push_summary("type", kind.as_str());
    human.push_summary("date", task.date.clone());
    if let Some(target) = task.target {
        human.push_summary("target", target.to_string());
    }
    human.push_next_step(format!("lifeops task set {} --done", task.id));

    emit_success(options.output, "task add", &task, Some(&human))
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let patch = DailyPatch {
        title: non_blank_title(options.title)?,
        target: match options.target {
            Some(target) => Some(finite("target", target)?),
            None => None,
        },
        actual: finite("actual", options.actual)?,
        completed: options.completed,
        is_deleted: None,
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass --title, --target, --clear-target, --actual, --done or --undone"
                .to_string(),
        ));
    }

    let tracker = super::open_tracker(options.data_dir)?;
    let daily = tracker.daily();
    let id = daily.resolve_id(&options.id)?;
    let task = daily.update(&id, &patch)?.ok_or_else(|| Error::NotFound {
        kind: "task",
        id: id.clone(),
    })?;

    let mut human = HumanOutput::new(format!("lifeops task set: {}", task.id));
    human.push_detail(describe_task(&task));
    if task.is_deleted {
        human.push_warning("task is deleted; it no longer counts toward the day");
    }

    emit_success(options.output, "task set", &task, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let daily = tracker.daily();
    let id = daily.resolve_id(&options.id)?;
    let task = daily.remove(&id)?.ok_or_else(|| Error::NotFound {
        kind: "task",
        id: id.clone(),
    })?;

    let mut human = HumanOutput::new(format!("lifeops task rm: {}", task.id));
    human.push_summary("title", task.title.clone());
    human.push_summary("date", task.date.clone());
    if !task.is_manual() {
        human.push_warning("derived task removed; it will not be derived again for this date");
    }

    emit_success(options.output, "task rm", &task, Some(&human))
}
