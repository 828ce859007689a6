//! One-shot import of undated legacy daily tasks.
//!
//! Legacy records carry no `date` or `source_template_id`. They are read as
//! untyped JSON so missing or oddly typed fields can be defaulted, stamped
//! with today's date as manual tasks, prepended to the dated list, and the
//! legacy key is then emptied.
//!
//! The skip guard is heuristic: a dated list that already holds a manual
//! dated task is taken as "already migrated". A user who created manual
//! tasks before legacy data appeared will therefore never have it imported.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::clock::format_date;
use crate::daily::{DailyInstance, DailyStore, TaskKind};
use crate::error::Result;
use crate::ids::{self, DAILY_PREFIX};
use crate::storage::{load_or_empty, save_collection, KeyValueStore};

/// Undated task as written by older versions
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDailyTask {
    pub id: Option<String>,
    pub title: Option<String>,
    pub kind: TaskKind,
    pub target: Option<f64>,
    pub actual: f64,
    pub completed: bool,
    pub is_deleted: bool,
}

impl LegacyDailyTask {
    /// Lenient decode; never fails
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: scalar_text(field(value, "id")).filter(|id| !id.is_empty()),
            title: scalar_text(field(value, "title")),
            kind: match field(value, "type").as_str() {
                Some("number") => TaskKind::Number,
                _ => TaskKind::Check,
            },
            target: coerce_number(field(value, "target")),
            actual: coerce_number(field(value, "actual")).unwrap_or(0.0),
            completed: truthy(field(value, "completed")),
            is_deleted: truthy(field(value, "is_deleted")),
        }
    }

    pub fn into_instance(self, date: &str, fallback_title: &str) -> DailyInstance {
        DailyInstance {
            id: self.id.unwrap_or_else(|| ids::new_id(DAILY_PREFIX)),
            title: self.title.unwrap_or_else(|| fallback_title.to_string()),
            kind: self.kind,
            target: self.target,
            actual: self.actual,
            completed: self.completed,
            is_deleted: self.is_deleted,
            date: date.to_string(),
            source_template_id: None,
        }
    }
}

static NULL: Value = Value::Null;

fn field<'a>(value: &'a Value, name: &str) -> &'a Value {
    value.get(name).unwrap_or(&NULL)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reader/clearer for the legacy key
#[derive(Debug, Clone)]
pub struct LegacyStore<S> {
    kv: S,
    key: String,
}

impl<S: KeyValueStore> LegacyStore<S> {
    pub fn new(kv: S, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    pub fn load(&self) -> Vec<LegacyDailyTask> {
        load_or_empty::<Value, _>(&self.kv, &self.key)
            .iter()
            .map(LegacyDailyTask::from_value)
            .collect()
    }

    /// Write an empty list so the records are never imported twice
    pub fn clear(&self) -> Result<()> {
        save_collection::<Value, _>(&self.kv, &self.key, &[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    NoLegacyData,
    AlreadyMigrated,
    Migrated { count: usize },
}

/// True when the dated list already holds a manual task with a date
pub fn looks_migrated(instances: &[DailyInstance]) -> bool {
    instances
        .iter()
        .any(|task| task.is_manual() && !task.date.is_empty())
}

pub fn migrate_legacy<S: KeyValueStore>(
    legacy: &LegacyStore<S>,
    daily: &DailyStore<S>,
    today: NaiveDate,
    fallback_title: &str,
) -> Result<MigrationOutcome> {
    let old = legacy.load();
    if old.is_empty() {
        return Ok(MigrationOutcome::NoLegacyData);
    }

    let current = daily.load();
    if looks_migrated(&current) {
        tracing::debug!(
            legacy = old.len(),
            "legacy tasks present but dated list looks migrated; skipping"
        );
        return Ok(MigrationOutcome::AlreadyMigrated);
    }

    let date = format_date(today);
    let count = old.len();
    let mut next: Vec<DailyInstance> = old
        .into_iter()
        .map(|task| task.into_instance(&date, fallback_title))
        .collect();
    next.extend(current);

    daily.save(&next)?;
    legacy.clear()?;

    tracing::info!(count, date = %date, "migrated legacy daily tasks");
    Ok(MigrationOutcome::Migrated { count })
}
