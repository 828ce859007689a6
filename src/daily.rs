//! Dated daily task instances.
//!
//! Instances are either created by hand (`source_template_id = None`) or
//! derived from a template (see [`crate::derive`]). They are patched in
//! place and never physically removed: deletion sets `is_deleted`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::format_date;
use crate::config::TasksConfig;
use crate::error::Result;
use crate::ids::{self, DAILY_PREFIX};
use crate::storage::{lenient, load_or_empty, save_collection, KeyValueStore};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    Check,
    Number,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Check => "check",
            TaskKind::Number => "number",
        }
    }

    /// Target given to freshly created records of this kind
    pub fn initial_target(self) -> Option<f64> {
        match self {
            TaskKind::Check => None,
            TaskKind::Number => Some(1.0),
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "check" => Ok(TaskKind::Check),
            "number" => Ok(TaskKind::Number),
            other => Err(crate::error::Error::InvalidArgument(format!(
                "task type must be 'check' or 'number', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInstance {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: TaskKind,
    #[serde(default, deserialize_with = "lenient")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub actual: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub is_deleted: bool,
    /// `YYYY-MM-DD`; kept as stored text so odd values never fail a load
    #[serde(default, deserialize_with = "lenient")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient")]
    pub source_template_id: Option<String>,
}

impl DailyInstance {
    /// Template id this instance was derived from, if any
    pub fn template_id(&self) -> Option<&str> {
        self.source_template_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    pub fn is_manual(&self) -> bool {
        self.template_id().is_none()
    }
}

/// Field patch applied by callers; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the target
    pub target: Option<Option<f64>>,
    pub actual: Option<f64>,
    pub completed: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl DailyPatch {
    pub fn is_empty(&self) -> bool {
        self == &DailyPatch::default()
    }

    pub fn apply(&self, task: &mut DailyInstance) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(target) = self.target {
            task.target = target;
        }
        if let Some(actual) = self.actual {
            task.actual = actual;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(is_deleted) = self.is_deleted {
            task.is_deleted = is_deleted;
        }
    }
}

/// Persists the dated instance list under a single key
#[derive(Debug, Clone)]
pub struct DailyStore<S> {
    kv: S,
    key: String,
    defaults: TasksConfig,
}

impl<S: KeyValueStore> DailyStore<S> {
    pub fn new(kv: S, key: impl Into<String>, defaults: TasksConfig) -> Self {
        Self {
            kv,
            key: key.into(),
            defaults,
        }
    }

    /// All instances in stored order; empty when missing or corrupt
    pub fn load(&self) -> Vec<DailyInstance> {
        load_or_empty(&self.kv, &self.key)
    }

    /// Replace the stored list
    pub fn save(&self, instances: &[DailyInstance]) -> Result<()> {
        save_collection(&self.kv, &self.key, instances)
    }

    /// Non-deleted instances for `date`, in stored order
    pub fn for_date(&self, date: NaiveDate) -> Vec<DailyInstance> {
        let date = format_date(date);
        self.load()
            .into_iter()
            .filter(|task| task.date == date && !task.is_deleted)
            .collect()
    }

    /// Build (without persisting) a manual instance with default title
    fn new_manual(&self, kind: TaskKind, date: NaiveDate) -> DailyInstance {
        let title = match kind {
            TaskKind::Check => self.defaults.check_title.clone(),
            TaskKind::Number => self.defaults.number_title.clone(),
        };
        DailyInstance {
            id: ids::new_id(DAILY_PREFIX),
            title,
            kind,
            target: kind.initial_target(),
            actual: 0.0,
            completed: false,
            is_deleted: false,
            date: format_date(date),
            source_template_id: None,
        }
    }

    /// Put `instance` in front of the stored list
    fn prepend(&self, instance: DailyInstance) -> Result<()> {
        let mut instances = self.load();
        instances.insert(0, instance);
        self.save(&instances)
    }

    /// Build a manual instance with `patch` applied over the defaults and
    /// persist it
    pub fn create_manual(
        &self,
        kind: TaskKind,
        date: NaiveDate,
        patch: &DailyPatch,
    ) -> Result<DailyInstance> {
        let mut instance = self.new_manual(kind, date);
        patch.apply(&mut instance);
        self.prepend(instance.clone())?;
        tracing::debug!(id = %instance.id, date = %instance.date, "created manual task");
        Ok(instance)
    }

    /// Patch the instance with `id`; `None` (and no write) when unknown
    pub fn update(&self, id: &str, patch: &DailyPatch) -> Result<Option<DailyInstance>> {
        let mut instances = self.load();
        let Some(task) = instances.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        patch.apply(task);
        let updated = task.clone();
        self.save(&instances)?;
        Ok(Some(updated))
    }

    /// Soft delete
    pub fn remove(&self, id: &str) -> Result<Option<DailyInstance>> {
        self.update(
            id,
            &DailyPatch {
                is_deleted: Some(true),
                ..DailyPatch::default()
            },
        )
    }

    /// Resolve a full or abbreviated id against stored instances
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let instances = self.load();
        ids::resolve_id("task", input, instances.iter().map(|task| task.id.as_str()))
    }
}
