//! lifeops emergency command implementation
//!
//! The CLI is the caller that keeps runs single: `start` is refused while
//! a run is active, and step commands act on the active run only.

use std::path::PathBuf;

use serde::Serialize;

use crate::clock::Clock;
use crate::emergency::{progress, EmergencyEngine, EmergencyFlow, EmergencyRun, Progress};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::KeyValueStore;

pub struct EmergencyOptions {
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct RunReport {
    run: EmergencyRun,
    #[serde(skip_serializing_if = "Option::is_none")]
    flow: Option<EmergencyFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<Progress>,
}

impl RunReport {
    fn new(run: EmergencyRun, flow: Option<EmergencyFlow>) -> Self {
        let progress = flow.as_ref().map(|flow| progress(flow, &run));
        Self {
            run,
            flow,
            progress,
        }
    }
}

#[derive(Serialize)]
struct StatusReport {
    active: Option<RunReport>,
}

/// Resolve a step given by id or 1-based position
fn resolve_step<'a>(flow: &'a EmergencyFlow, input: &str) -> Result<&'a str> {
    let trimmed = input.trim();
    if let Some(step) = flow.step(trimmed) {
        return Ok(step.id.as_str());
    }
    if let Ok(position) = trimmed.parse::<usize>() {
        if let Some(step) = position.checked_sub(1).and_then(|idx| flow.steps.get(idx)) {
            return Ok(step.id.as_str());
        }
    }
    Err(Error::NotFound {
        kind: "step",
        id: input.to_string(),
    })
}

fn push_run_details(human: &mut HumanOutput, report: &RunReport) {
    human.push_summary("run", report.run.id.clone());
    human.push_summary("started", report.run.started_at.to_rfc3339());
    if let Some(ended) = report.run.ended_at {
        human.push_summary("ended", ended.to_rfc3339());
    }

    let Some(flow) = &report.flow else {
        human.push_warning(format!(
            "flow '{}' no longer exists; steps cannot be shown",
            report.run.flow_id
        ));
        return;
    };

    human.push_summary("flow", flow.title.clone());
    if let Some(progress) = report.progress {
        human.push_summary("progress", format!("{}/{}", progress.done, progress.total));
    }
    for (idx, step) in flow.steps.iter().enumerate() {
        let state = report.run.step_state(&step.id);
        let mark = if state.is_some_and(|s| s.done) { "x" } else { " " };
        human.push_detail(format!("[{mark}] Step {}: {}", idx + 1, step.text));
        if let Some(caution) = &step.caution {
            human.push_detail(format!("    caution: {caution}"));
        }
        if let Some(note) = state.and_then(|s| s.note.as_deref()).filter(|n| !n.is_empty()) {
            human.push_detail(format!("    note: {note}"));
        }
    }
}

pub fn run_flows(options: EmergencyOptions) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let flows = tracker.emergency().load_flows()?;

    let mut human = HumanOutput::new(format!("lifeops emergency flows: {}", flows.len()));
    for flow in &flows {
        human.push_detail(format!("{} ({} steps) <{}>", flow.title, flow.steps.len(), flow.id));
    }

    emit_success(options.output, "emergency flows", &flows, Some(&human))
}

pub fn run_status(options: EmergencyOptions) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let engine = tracker.emergency();

    let active = match engine.active_run() {
        Some(run) => {
            let flow = engine.find_flow(&run.flow_id)?;
            Some(RunReport::new(run, flow))
        }
        None => None,
    };

    let mut human;
    match &active {
        Some(report) => {
            human = HumanOutput::new("lifeops emergency: run in progress");
            push_run_details(&mut human, report);
            human.push_next_step("lifeops emergency check <step>");
            human.push_next_step("lifeops emergency end");
        }
        None => {
            human = HumanOutput::new("lifeops emergency: no active run");
            human.push_next_step("lifeops emergency start");
        }
    }

    emit_success(
        options.output,
        "emergency status",
        &StatusReport { active },
        Some(&human),
    )
}

pub fn run_start(options: EmergencyOptions, flow_id: Option<String>) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let engine = tracker.emergency();

    if let Some(active) = engine.active_run() {
        return Err(Error::RunActive(active.id));
    }

    let flows = engine.load_flows()?;
    let flow = match flow_id {
        Some(id) => flows.into_iter().find(|flow| flow.id == id).ok_or(Error::NotFound {
            kind: "flow",
            id,
        })?,
        None => flows.into_iter().next().ok_or_else(|| Error::NotFound {
            kind: "flow",
            id: "(any)".to_string(),
        })?,
    };

    let run = engine.start_run(&flow)?;
    let report = RunReport::new(run, Some(flow));

    let mut human = HumanOutput::new("lifeops emergency start");
    push_run_details(&mut human, &report);
    human.push_next_step("lifeops emergency check 1");

    emit_success(options.output, "emergency start", &report, Some(&human))
}

/// Active run plus its flow, or the matching user error
fn active_with_flow<S: KeyValueStore, C: Clock>(
    engine: &EmergencyEngine<S, C>,
) -> Result<(EmergencyRun, EmergencyFlow)> {
    let run = engine.active_run().ok_or(Error::NoActiveRun)?;
    let flow = engine.find_flow(&run.flow_id)?.ok_or_else(|| Error::NotFound {
        kind: "flow",
        id: run.flow_id.clone(),
    })?;
    Ok((run, flow))
}

pub fn run_check(options: EmergencyOptions, step: &str, done: bool) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let engine = tracker.emergency();
    let (run, flow) = active_with_flow(&engine)?;
    let step_id = resolve_step(&flow, step)?.to_string();

    let run = engine.set_step_done(&run, &step_id, done)?;
    let report = RunReport::new(run, Some(flow));

    let verb = if done { "done" } else { "not done" };
    let mut human = HumanOutput::new(format!("lifeops emergency check: {step_id} {verb}"));
    push_run_details(&mut human, &report);
    if report.progress.is_some_and(|p| p.done == p.total) {
        human.push_next_step("lifeops emergency end");
    }

    emit_success(options.output, "emergency check", &report, Some(&human))
}

pub fn run_note(options: EmergencyOptions, step: &str, text: &str) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let engine = tracker.emergency();
    let (run, flow) = active_with_flow(&engine)?;
    let step_id = resolve_step(&flow, step)?.to_string();

    let run = engine.set_step_note(&run, &step_id, text)?;
    let report = RunReport::new(run, Some(flow));

    let mut human = HumanOutput::new(format!("lifeops emergency note: {step_id}"));
    push_run_details(&mut human, &report);

    emit_success(options.output, "emergency note", &report, Some(&human))
}

pub fn run_end(options: EmergencyOptions) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let engine = tracker.emergency();
    let run = engine.active_run().ok_or(Error::NoActiveRun)?;

    let ended = engine.end_run(&run)?;
    let flow = engine.find_flow(&ended.flow_id)?;
    let report = RunReport::new(ended, flow);

    let mut human = HumanOutput::new("lifeops emergency end: run closed");
    push_run_details(&mut human, &report);

    emit_success(options.output, "emergency end", &report, Some(&human))
}

pub fn run_history(options: EmergencyOptions) -> Result<()> {
    let tracker = super::open_tracker(options.data_dir)?;
    let engine = tracker.emergency();
    let flows = engine.load_flows()?;

    let reports: Vec<RunReport> = engine
        .history()
        .into_iter()
        .map(|run| {
            let flow = flows.iter().find(|flow| flow.id == run.flow_id).cloned();
            RunReport::new(run, flow)
        })
        .collect();

    let mut human = HumanOutput::new(format!("lifeops emergency history: {}", reports.len()));
    for report in &reports {
        let title = report
            .flow
            .as_ref()
            .map(|flow| flow.title.as_str())
            .unwrap_or(report.run.flow_id.as_str());
        let progress = report
            .progress
            .map(|p| format!("{}/{}", p.done, p.total))
            .unwrap_or_else(|| "-".to_string());
        human.push_detail(format!(
            "{} {} {} <{}>",
            report.run.started_at.format("%Y-%m-%d %H:%M"),
            title,
            progress,
            report.run.id
        ));
    }

    emit_success(options.output, "emergency history", &reports, Some(&human))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emergency::default_flows;

    #[test]
    fn resolve_step_accepts_id_and_position() {
        let flow = &default_flows()[0];
        assert_eq!(resolve_step(flow, "s3").expect("id"), "s3");
        assert_eq!(resolve_step(flow, "1").expect("position"), "s1");
        assert_eq!(resolve_step(flow, " 6 ").expect("position"), "s6");
    }

    #[test]
    fn resolve_step_rejects_out_of_range() {
        let flow = &default_flows()[0];
        assert!(matches!(resolve_step(flow, "0"), Err(Error::NotFound { .. })));
        assert!(matches!(resolve_step(flow, "7"), Err(Error::NotFound { .. })));
        assert!(matches!(resolve_step(flow, "s9"), Err(Error::NotFound { .. })));
    }
}
