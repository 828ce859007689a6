//! lifeops template command implementation

use std::path::PathBuf;

use crate::daily::TaskKind;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::template::{Template, TemplatePatch};

pub struct LsOptions {
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct AddOptions {
    pub kind: String,
    pub title: Option<String>,
    pub target: Option<f64>,
    pub unit: Option<String>,
    pub inactive: bool,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct SetOptions {
    pub id: String,
    pub title: Option<String>,
    pub target: Option<Option<f64>>,
    pub unit: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

fn describe_template(template: &Template) -> String {
    let state = if template.is_active { "on " } else { "off" };
    let target = match (template.kind, template.target) {
        (TaskKind::Number, Some(target)) => match &template.unit {
            Some(unit) => format!(" target {target} {unit}"),
            None => format!(" target {target}"),
        },
        (TaskKind::Number, None) => " (checkbox)".to_string(),
        (TaskKind::Check, _) => String::new(),
    };
    format!(
        "[{state}] {} ({}){target} <{}>",
        template.title,
        template.kind.as_str(),
        template.id
    )
}

fn validate_patch(patch: &TemplatePatch) -> Result<()> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }
    }
    if let Some(Some(target)) = patch.target {
        if !target.is_finite() {
            return Err(Error::InvalidArgument(
                "target must be a finite number".to_string(),
            ));
        }
    }
    Ok(())
}

pub fn run_ls(options: LsOptions) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let templates = tracker.templates().load();

    let active = templates.iter().filter(|t| t.is_active).count();
    let mut human = HumanOutput::new(format!("lifeops templates: {}", templates.len()));
    human.push_summary("active", active.to_string());
    for template in &templates {
        human.push_detail(describe_template(template));
    }
    if templates.is_empty() {
        human.push_next_step("lifeops template add check --title \"...\"");
    }

    emit_success(options.output, "template ls", &templates, Some(&human))
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let kind: TaskKind = options.kind.parse()?;
    let patch = TemplatePatch {
        title: options.title,
        is_active: options.inactive.then_some(false),
        target: options.target.map(Some),
        unit: options.unit.map(Some),
    };
    validate_patch(&patch)?;

    let tracker = super::open_tracker(options.data_dir)?;
    let template = tracker.templates().create(kind, &patch)?;

    let mut human = HumanOutput::new(format!("lifeops template add: {}", template.title));
    human.push_detail(describe_template(&template));
    if template.is_active {
        human.push_next_step("lifeops today");
    }

    emit_success(options.output, "template add", &template, Some(&human))
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let patch = TemplatePatch {
        title: options.title,
        is_active: options.is_active,
        target: options.target,
        unit: options.unit,
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass --title, --target, --unit, --active or --inactive (or a --clear-* flag)"
                .to_string(),
        ));
    }
    validate_patch(&patch)?;

    let tracker = super::open_tracker(options.data_dir)?;
    let store = tracker.templates();
    let id = store.resolve_id(&options.id)?;
    let template = store.update(&id, &patch)?.ok_or_else(|| Error::NotFound {
        kind: "template",
        id: id.clone(),
    })?;

    let mut human = HumanOutput::new(format!("lifeops template set: {}", template.id));
    human.push_detail(describe_template(&template));
    human.push_warning("tasks already derived from this template are unchanged");

    emit_success(options.output, "template set", &template, Some(&human))
}
