//! Recurring task templates.
//!
//! The store is a plain list persister: `create` and `update` are
//! load-patch-save helpers over [`TemplateStore::load`] and
//! [`TemplateStore::save`], with no merge semantics of their own.

use serde::{Deserialize, Serialize};

use crate::config::TasksConfig;
use crate::daily::TaskKind;
use crate::error::Result;
use crate::ids::{self, TEMPLATE_PREFIX};
use crate::storage::{lenient, load_or_empty, save_collection, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: TaskKind,
    /// `None` on a number template means "complete by checkbox"
    #[serde(default, deserialize_with = "lenient")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    pub title: Option<String>,
    pub is_active: Option<bool>,
    pub target: Option<Option<f64>>,
    pub unit: Option<Option<String>>,
}

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self == &TemplatePatch::default()
    }

    pub fn apply(&self, template: &mut Template) {
        if let Some(title) = &self.title {
            template.title = title.clone();
        }
        if let Some(is_active) = self.is_active {
            template.is_active = is_active;
        }
        if let Some(target) = self.target {
            template.target = target;
        }
        if let Some(unit) = &self.unit {
            // Blank units are stored as absent.
            template.unit = unit.clone().filter(|unit| !unit.is_empty());
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore<S> {
    kv: S,
    key: String,
    defaults: TasksConfig,
}

impl<S: KeyValueStore> TemplateStore<S> {
    pub fn new(kv: S, key: impl Into<String>, defaults: TasksConfig) -> Self {
        Self {
            kv,
            key: key.into(),
            defaults,
        }
    }

    pub fn load(&self) -> Vec<Template> {
        load_or_empty(&self.kv, &self.key)
    }

    pub fn save(&self, templates: &[Template]) -> Result<()> {
        save_collection(&self.kv, &self.key, templates)
    }

    /// Templates that take part in derivation, in stored order
    pub fn active(&self) -> Vec<Template> {
        self.load()
            .into_iter()
            .filter(|template| template.is_active)
            .collect()
    }

    /// Build (without persisting) an active template with default title
    fn new_template(&self, kind: TaskKind) -> Template {
        let title = match kind {
            TaskKind::Check => self.defaults.template_check_title.clone(),
            TaskKind::Number => self.defaults.template_number_title.clone(),
        };
        Template {
            id: ids::new_id(TEMPLATE_PREFIX),
            title,
            kind,
            target: kind.initial_target(),
            unit: None,
            is_active: true,
        }
    }

    /// Persist `template` at the front of the list (newest first)
    fn prepend(&self, template: Template) -> Result<()> {
        let mut templates = self.load();
        templates.insert(0, template);
        self.save(&templates)
    }

    /// Build a template with `patch` applied over the defaults and persist it
    pub fn create(&self, kind: TaskKind, patch: &TemplatePatch) -> Result<Template> {
        let mut template = self.new_template(kind);
        patch.apply(&mut template);
        self.prepend(template.clone())?;
        tracing::debug!(id = %template.id, "created template");
        Ok(template)
    }

    pub fn update(&self, id: &str, patch: &TemplatePatch) -> Result<Option<Template>> {
        let mut templates = self.load();
        let Some(template) = templates.iter_mut().find(|template| template.id == id) else {
            return Ok(None);
        };
        patch.apply(template);
        let updated = template.clone();
        self.save(&templates)?;
        tracing::debug!(id, active = updated.is_active, "updated template");
        Ok(Some(updated))
    }

    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let templates = self.load();
        ids::resolve_id(
            "template",
            input,
            templates.iter().map(|template| template.id.as_str()),
        )
    }
}
