//! Emergency checklists: fixed flows and resumable runs.
//!
//! A run moves `not started -> active -> ended`. Every transition is
//! written through immediately, so an interrupted run is picked up again
//! by [`EmergencyEngine::active_run`] after a restart. The engine does not
//! refuse a second `start_run` while one is active; callers check first.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::Result;
use crate::ids::{self, RUN_PREFIX};
use crate::storage::{lenient, load_or_empty, save_collection, KeyValueStore};

/// Id of the flow seeded on first access
pub const DEFAULT_FLOW_ID: &str = "flow_qrh_basic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyStep {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub caution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyFlow {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub steps: Vec<EmergencyStep>,
}

impl EmergencyFlow {
    pub fn step(&self, step_id: &str) -> Option<&EmergencyStep> {
        self.steps.iter().find(|step| step.id == step_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    #[serde(default, deserialize_with = "lenient")]
    pub done: bool,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyRun {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub flow_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub started_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub step_states: BTreeMap<String, StepState>,
}

impl EmergencyRun {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn step_state(&self, step_id: &str) -> Option<&StepState> {
        self.step_states.get(step_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// Count flow steps marked done; states for unknown steps are ignored
pub fn progress(flow: &EmergencyFlow, run: &EmergencyRun) -> Progress {
    let done = flow
        .steps
        .iter()
        .filter(|step| run.step_state(&step.id).is_some_and(|state| state.done))
        .count();
    Progress {
        done,
        total: flow.steps.len(),
    }
}

/// Flows written to storage when none exist yet
pub fn default_flows() -> Vec<EmergencyFlow> {
    let step = |id: &str, text: &str, caution: Option<&str>| EmergencyStep {
        id: id.to_string(),
        text: text.to_string(),
        caution: caution.map(str::to_string),
    };
    vec![EmergencyFlow {
        id: DEFAULT_FLOW_ID.to_string(),
        title: "Emergency reset (QRH) - basic".to_string(),
        steps: vec![
            step("s1", "Stop every non-essential task; switch to damage control only", None),
            step(
                "s2",
                "Body check: water, food, breathing, pain (ask for help if needed)",
                Some("With acute danger signs, contact medical help or an emergency contact first"),
            ),
            step("s3", "Empty your head: write down everything causing anxiety, no judging", None),
            step("s4", "Pick the single most important next step; phrase it as a <=10 minute action", None),
            step("s5", "Do that action and record the result", None),
            step("s6", "Decide: continue with the next step or return to the daily routine", None),
        ],
    }]
}

/// Flow definitions and run history over two keys
#[derive(Debug, Clone)]
pub struct EmergencyEngine<S, C> {
    kv: S,
    clock: C,
    flows_key: String,
    runs_key: String,
}

impl<S: KeyValueStore, C: Clock> EmergencyEngine<S, C> {
    pub fn new(kv: S, clock: C, flows_key: impl Into<String>, runs_key: impl Into<String>) -> Self {
        Self {
            kv,
            clock,
            flows_key: flows_key.into(),
            runs_key: runs_key.into(),
        }
    }

    // =========================================================================
    // Flows
    // =========================================================================

    /// Seed [`default_flows`] if the flow key has never been written.
    ///
    /// Returns true when the seed was written. Existing data, even an empty
    /// or corrupt value, is left alone.
    pub fn ensure_default_flows(&self) -> Result<bool> {
        match self.kv.get(&self.flows_key) {
            Ok(Some(raw)) if !raw.is_empty() => return Ok(false),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(key = %self.flows_key, error = %err, "cannot read flows; not seeding");
                return Ok(false);
            }
        }
        save_collection(&self.kv, &self.flows_key, &default_flows())?;
        tracing::debug!(key = %self.flows_key, "seeded default emergency flows");
        Ok(true)
    }

    pub fn load_flows(&self) -> Result<Vec<EmergencyFlow>> {
        self.ensure_default_flows()?;
        Ok(load_or_empty(&self.kv, &self.flows_key))
    }

    /// Look up a flow; a dangling id resolves to `None`
    pub fn find_flow(&self, flow_id: &str) -> Result<Option<EmergencyFlow>> {
        Ok(self
            .load_flows()?
            .into_iter()
            .find(|flow| flow.id == flow_id))
    }

    // =========================================================================
    // Runs
    // =========================================================================

    pub fn load_runs(&self) -> Vec<EmergencyRun> {
        load_or_empty(&self.kv, &self.runs_key)
    }

    pub fn save_runs(&self, runs: &[EmergencyRun]) -> Result<()> {
        save_collection(&self.kv, &self.runs_key, runs)
    }

    /// First run in stored order without an end time
    pub fn active_run(&self) -> Option<EmergencyRun> {
        self.load_runs().into_iter().find(EmergencyRun::is_active)
    }

    /// Ended runs, newest first as stored
    pub fn history(&self) -> Vec<EmergencyRun> {
        self.load_runs()
            .into_iter()
            .filter(|run| !run.is_active())
            .collect()
    }

    pub fn start_run(&self, flow: &EmergencyFlow) -> Result<EmergencyRun> {
        let run = EmergencyRun {
            id: ids::new_id(RUN_PREFIX),
            flow_id: flow.id.clone(),
            started_at: self.clock.now(),
            ended_at: None,
            step_states: flow
                .steps
                .iter()
                .map(|step| (step.id.clone(), StepState::default()))
                .collect(),
        };

        let mut runs = self.load_runs();
        runs.insert(0, run.clone());
        self.save_runs(&runs)?;

        tracing::info!(run = %run.id, flow = %run.flow_id, "started emergency run");
        Ok(run)
    }

    /// Replace the stored run with the same id, or prepend it if unknown.
    ///
    /// `run` must be the complete record; nothing is merged.
    pub fn update_run(&self, run: &EmergencyRun) -> Result<()> {
        let mut runs = self.load_runs();
        match runs.iter_mut().find(|stored| stored.id == run.id) {
            Some(stored) => *stored = run.clone(),
            None => runs.insert(0, run.clone()),
        }
        self.save_runs(&runs)
    }

    pub fn end_run(&self, run: &EmergencyRun) -> Result<EmergencyRun> {
        let ended = EmergencyRun {
            ended_at: Some(self.clock.now()),
            ..run.clone()
        };
        self.update_run(&ended)?;
        tracing::info!(run = %ended.id, "ended emergency run");
        Ok(ended)
    }

    /// Mark a step done or not done and persist the resulting record
    pub fn set_step_done(&self, run: &EmergencyRun, step_id: &str, done: bool) -> Result<EmergencyRun> {
        let mut next = run.clone();
        next.step_states.entry(step_id.to_string()).or_default().done = done;
        self.update_run(&next)?;
        Ok(next)
    }

    /// Attach a note to a step and persist the resulting record
    pub fn set_step_note(&self, run: &EmergencyRun, step_id: &str, note: &str) -> Result<EmergencyRun> {
        let mut next = run.clone();
        next.step_states.entry(step_id.to_string()).or_default().note = Some(note.to_string());
        self.update_run(&next)?;
        Ok(next)
    }
}
