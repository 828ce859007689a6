//! Daily derivation: materialize today's instances from active templates.
//!
//! A template yields at most one instance per date. The dedup key is
//! `{date}::{template_id}` and any stored instance carrying it blocks
//! re-derivation, deleted or not. Derivation only creates; it never
//! reconciles template edits into instances that already exist.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::format_date;
use crate::daily::{DailyInstance, DailyStore};
use crate::error::Result;
use crate::ids::{self, DAILY_PREFIX};
use crate::storage::KeyValueStore;
use crate::template::{Template, TemplateStore};

pub fn dedup_key(date: &str, template_id: &str) -> String {
    format!("{date}::{template_id}")
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivationReport {
    pub date: String,
    pub created: Vec<DailyInstance>,
    /// Active templates that already had an instance for the date
    pub skipped: usize,
}

impl DerivationReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

/// Compute the instances to create for `date` without touching storage.
///
/// Only active templates are considered. Returns the new instances in
/// template order and the number of active templates skipped.
pub fn plan(templates: &[Template], existing: &[DailyInstance], date: &str) -> (Vec<DailyInstance>, usize) {
    let mut seen: HashSet<String> = existing
        .iter()
        .filter(|task| task.date == date)
        .filter_map(|task| task.template_id())
        .map(|template_id| dedup_key(date, template_id))
        .collect();

    let mut created = Vec::new();
    let mut skipped = 0;
    for template in templates.iter().filter(|template| template.is_active) {
        if !seen.insert(dedup_key(date, &template.id)) {
            skipped += 1;
            continue;
        }
        created.push(instance_from_template(template, date));
    }
    (created, skipped)
}

fn instance_from_template(template: &Template, date: &str) -> DailyInstance {
    DailyInstance {
        id: ids::new_id(DAILY_PREFIX),
        title: template.title.clone(),
        kind: template.kind,
        target: template.target,
        actual: 0.0,
        completed: false,
        is_deleted: false,
        date: date.to_string(),
        source_template_id: Some(template.id.clone()),
    }
}

/// Derive and persist the instances for `date`.
///
/// New instances go in front of the stored list in one write; when nothing
/// is new, nothing is written.
pub fn derive_for_date<S: KeyValueStore>(
    templates: &TemplateStore<S>,
    daily: &DailyStore<S>,
    date: NaiveDate,
) -> Result<DerivationReport> {
    let date = format_date(date);
    let active = templates.active();
    let existing = daily.load();

    let (created, skipped) = plan(&active, &existing, &date);

    if !created.is_empty() {
        let mut next = Vec::with_capacity(created.len() + existing.len());
        next.extend(created.iter().cloned());
        next.extend(existing);
        daily.save(&next)?;
    }

    tracing::debug!(
        date = %date,
        created = created.len(),
        skipped,
        "derived daily instances"
    );

    Ok(DerivationReport {
        date,
        created,
        skipped,
    })
}
