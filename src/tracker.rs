//! Wiring of stores, clock and configuration.
//!
//! [`Tracker::open_day`] is the "today" load: legacy migration first,
//! then derivation, then the listing and its score.

use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::{format_date, Clock};
use crate::config::Config;
use crate::daily::{DailyInstance, DailyStore};
use crate::derive::{self, DerivationReport};
use crate::emergency::EmergencyEngine;
use crate::error::Result;
use crate::migrate::{self, LegacyStore, MigrationOutcome};
use crate::scoring::{self, ScoreSummary};
use crate::storage::KeyValueStore;
use crate::template::TemplateStore;

#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub date: String,
    pub migration: MigrationOutcome,
    pub derived: usize,
    pub tasks: Vec<DailyInstance>,
    pub summary: ScoreSummary,
}

pub struct Tracker<S, C> {
    kv: S,
    clock: C,
    config: Config,
}

impl<S: KeyValueStore, C: Clock> Tracker<S, C> {
    pub fn new(kv: S, clock: C, config: Config) -> Self {
        Self { kv, clock, config }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn templates(&self) -> TemplateStore<&S> {
        TemplateStore::new(
            &self.kv,
            self.config.storage.keys.templates.as_str(),
            self.config.tasks.clone(),
        )
    }

    pub fn daily(&self) -> DailyStore<&S> {
        DailyStore::new(
            &self.kv,
            self.config.storage.keys.daily_instances.as_str(),
            self.config.tasks.clone(),
        )
    }

    pub fn legacy(&self) -> LegacyStore<&S> {
        LegacyStore::new(&self.kv, self.config.storage.keys.legacy_tasks.as_str())
    }

    pub fn emergency(&self) -> EmergencyEngine<&S, &C> {
        EmergencyEngine::new(
            &self.kv,
            &self.clock,
            self.config.storage.keys.emergency_flows.as_str(),
            self.config.storage.keys.emergency_runs.as_str(),
        )
    }

    pub fn migrate_legacy(&self) -> Result<MigrationOutcome> {
        migrate::migrate_legacy(
            &self.legacy(),
            &self.daily(),
            self.clock.today(),
            &self.config.tasks.legacy_title,
        )
    }

    pub fn derive_for(&self, date: NaiveDate) -> Result<DerivationReport> {
        derive::derive_for_date(&self.templates(), &self.daily(), date)
    }

    /// Run the day-load sequence for `date` (today when `None`).
    ///
    /// Migration always stamps legacy tasks with the clock's today, even
    /// when another date is being opened.
    pub fn open_day(&self, date: Option<NaiveDate>) -> Result<DayReport> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let migration = self.migrate_legacy()?;
        let derivation = self.derive_for(date)?;
        let tasks = self.daily().for_date(date);
        let summary = scoring::summarize(&tasks);

        Ok(DayReport {
            date: format_date(date),
            migration,
            derived: derivation.created.len(),
            tasks,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::daily::{DailyPatch, TaskKind};
    use crate::storage::MemoryStore;
    use crate::template::Template;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")
    }

    fn tracker(kv: &MemoryStore) -> Tracker<&MemoryStore, FixedClock> {
        Tracker::new(kv, FixedClock::at_date(today()), Config::default())
    }

    #[test]
    fn empty_day_scores_one() {
        let kv = MemoryStore::new();
        let report = tracker(&kv).open_day(None).expect("open");

        assert_eq!(report.date, "2024-01-01");
        assert!(report.tasks.is_empty());
        assert_eq!(report.summary.score, 1.0);
        assert_eq!(report.migration, MigrationOutcome::NoLegacyData);
    }

    #[test]
    fn open_day_migrates_then_derives() {
        let keys = Config::default().storage.keys;
        let kv = MemoryStore::new().with_entry(
            keys.legacy_tasks.as_str(),
            json!([{"id": "old", "title": "Old", "completed": true}]).to_string(),
        );
        let tracker = tracker(&kv);
        tracker
            .templates()
            .save(&[Template {
                id: "t1".to_string(),
                title: "Pushups".to_string(),
                kind: TaskKind::Number,
                target: Some(20.0),
                unit: Some("reps".to_string()),
                is_active: true,
            }])
            .expect("templates");

        let report = tracker.open_day(None).expect("open");

        assert_eq!(report.migration, MigrationOutcome::Migrated { count: 1 });
        assert_eq!(report.derived, 1);
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks[0].source_template_id.as_deref(), Some("t1"));
        assert_eq!(report.tasks[1].id, "old");
        assert_eq!(report.summary.score, 0.5);

        let again = tracker.open_day(None).expect("reopen");
        assert_eq!(again.migration, MigrationOutcome::NoLegacyData);
        assert_eq!(again.derived, 0);
        assert_eq!(again.tasks.len(), 2);
    }

    #[test]
    fn score_reflects_patched_tasks() {
        let kv = MemoryStore::new();
        let tracker = tracker(&kv);
        let task = tracker
            .daily()
            .create_manual(TaskKind::Number, today(), &DailyPatch::default())
            .expect("create");
        let patch = DailyPatch {
            target: Some(Some(4.0)),
            actual: Some(6.0),
            ..DailyPatch::default()
        };
        tracker.daily().update(&task.id, &patch).expect("update");

        let report = tracker.open_day(None).expect("open");

        assert_eq!(report.summary.score, 1.5);
    }

    #[test]
    fn other_dates_are_listed_separately() {
        let kv = MemoryStore::new();
        let tracker = tracker(&kv);
        tracker
            .daily()
            .create_manual(TaskKind::Check, today(), &DailyPatch::default())
            .expect("today");

        let tomorrow = today().succ_opt().expect("tomorrow");
        let report = tracker.open_day(Some(tomorrow)).expect("open");

        assert_eq!(report.date, "2024-01-02");
        assert!(report.tasks.is_empty());
    }

    #[test]
    fn migration_stamps_the_clock_date_when_opening_another_day() {
        let keys = Config::default().storage.keys;
        let kv = MemoryStore::new().with_entry(
            keys.legacy_tasks.as_str(),
            json!([{"id": "old", "title": "Old"}]).to_string(),
        );
        let tracker = tracker(&kv);
        let other = NaiveDate::from_ymd_opt(2024, 2, 15).expect("date");

        let report = tracker.open_day(Some(other)).expect("open");

        assert_eq!(report.date, "2024-02-15");
        assert_eq!(report.migration, MigrationOutcome::Migrated { count: 1 });
        assert!(report.tasks.is_empty());

        let migrated = tracker.daily().for_date(today());
        assert_eq!(migrated.len(), 1);
        assert_eq!(migrated[0].id, "old");
        assert_eq!(migrated[0].date, "2024-01-01");
    }
}
