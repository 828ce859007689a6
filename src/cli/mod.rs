//! Command-line interface for lifeops
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::clock::SystemClock;
use crate::config::{self, Config};
use crate::error::Result;
use crate::output::OutputOptions;
use crate::storage::FileStore;
use crate::tracker::Tracker;

mod emergency;
mod task;
mod template;
mod today;

/// lifeops - daily templates, day score and emergency checklists
///
/// Tracks today's tasks (manual or derived from recurring templates),
/// scores the day, and runs step-by-step emergency checklists that
/// survive restarts.
#[derive(Parser, Debug)]
#[command(name = "lifeops")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding lifeops data and lifeops.toml
    #[arg(long, global = true, env = "LIFEOPS_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a day: migrate legacy tasks, derive from templates, show score
    Today {
        /// Day to open (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Manual task operations on dated instances
    #[command(subcommand)]
    Task(TaskCommands),

    /// Recurring template management
    #[command(subcommand)]
    Template(TemplateCommands),

    /// Emergency checklist runs
    #[command(subcommand)]
    Emergency(EmergencyCommands),
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a manual task
    Add {
        /// Task type: check or number
        kind: String,

        /// Title (defaults per type from lifeops.toml)
        #[arg(long)]
        title: Option<String>,

        /// Target for number tasks
        #[arg(long, allow_negative_numbers = true)]
        target: Option<f64>,

        /// Day the task belongs to (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Edit a task
    Set {
        /// Task id (a unique prefix or suffix is enough)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, allow_negative_numbers = true, conflicts_with = "clear_target")]
        target: Option<f64>,

        /// Remove the target (number task falls back to checkbox)
        #[arg(long)]
        clear_target: bool,

        #[arg(long, allow_negative_numbers = true)]
        actual: Option<f64>,

        /// Mark completed
        #[arg(long, conflicts_with = "undone")]
        done: bool,

        /// Mark not completed
        #[arg(long)]
        undone: bool,
    },

    /// Delete a task (kept on disk, hidden from the day)
    Rm {
        /// Task id (a unique prefix or suffix is enough)
        id: String,
    },
}

/// Template subcommands
#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List templates
    Ls,

    /// Add a template (active, newest first)
    Add {
        /// Template type: check or number
        kind: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        target: Option<f64>,

        #[arg(long)]
        unit: Option<String>,

        /// Create the template inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Edit a template; already derived tasks are not changed
    Set {
        /// Template id (a unique prefix or suffix is enough)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, allow_negative_numbers = true, conflicts_with = "clear_target")]
        target: Option<f64>,

        #[arg(long)]
        clear_target: bool,

        #[arg(long, conflicts_with = "clear_unit")]
        unit: Option<String>,

        #[arg(long)]
        clear_unit: bool,

        /// Resume deriving this template
        #[arg(long, conflicts_with = "inactive")]
        active: bool,

        /// Stop deriving this template
        #[arg(long)]
        inactive: bool,
    },
}

/// Emergency subcommands
#[derive(Subcommand, Debug)]
pub enum EmergencyCommands {
    /// List available flows
    Flows,

    /// Show the active run and its progress
    Status,

    /// Start a run (refused while another run is active)
    Start {
        /// Flow id (defaults to the first flow)
        #[arg(long)]
        flow: Option<String>,
    },

    /// Mark a step of the active run as done
    Check {
        /// Step id or 1-based step number
        step: String,

        /// Mark the step as not done instead
        #[arg(long)]
        undo: bool,
    },

    /// Attach a note to a step of the active run
    Note {
        /// Step id or 1-based step number
        step: String,

        /// Note text (empty clears it)
        text: String,
    },

    /// End the active run
    End,

    /// List ended runs
    History,
}

/// Tracker over the file store in the resolved data directory
pub(crate) type FileTracker = Tracker<FileStore, SystemClock>;

pub(crate) fn open_tracker(data_dir: Option<PathBuf>) -> Result<FileTracker> {
    let data_dir = config::resolve_data_dir(data_dir)?;
    let config = Config::load_from_dir(&data_dir)?;
    let store = FileStore::new(data_dir);
    tracing::debug!(data_dir = %store.root().display(), "opening lifeops data");
    Ok(Tracker::new(store, SystemClock, config))
}

/// `true`, `false`, or untouched
fn flag_pair(set: bool, unset: bool) -> Option<bool> {
    match (set, unset) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Explicit value, explicit clear, or untouched
fn optional_update<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let data_dir = self.data_dir;

        match self.command {
            Commands::Today { date } => today::run(today::TodayOptions {
                date,
                data_dir,
                output,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    kind,
                    title,
                    target,
                    date,
                } => task::run_add(task::AddOptions {
                    kind,
                    title,
                    target,
                    date,
                    data_dir,
                    output,
                }),
                TaskCommands::Set {
                    id,
                    title,
                    target,
                    clear_target,
                    actual,
                    done,
                    undone,
                } => task::run_set(task::SetOptions {
                    id,
                    title,
                    target: optional_update(target, clear_target),
                    actual,
                    completed: flag_pair(done, undone),
                    data_dir,
                    output,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    id,
                    data_dir,
                    output,
                }),
            },
            Commands::Template(cmd) => match cmd {
                TemplateCommands::Ls => template::run_ls(template::LsOptions { data_dir, output }),
                TemplateCommands::Add {
                    kind,
                    title,
                    target,
                    unit,
                    inactive,
                } => template::run_add(template::AddOptions {
                    kind,
                    title,
                    target,
                    unit,
                    inactive,
                    data_dir,
                    output,
                }),
                TemplateCommands::Set {
                    id,
                    title,
                    target,
                    clear_target,
                    unit,
                    clear_unit,
                    active,
                    inactive,
                } => template::run_set(template::SetOptions {
                    id,
                    title,
                    target: optional_update(target, clear_target),
                    unit: optional_update(unit, clear_unit),
                    is_active: flag_pair(active, inactive),
                    data_dir,
                    output,
                }),
            },
            Commands::Emergency(cmd) => {
                let options = emergency::EmergencyOptions { data_dir, output };
                match cmd {
                    EmergencyCommands::Flows => emergency::run_flows(options),
                    EmergencyCommands::Status => emergency::run_status(options),
                    EmergencyCommands::Start { flow } => emergency::run_start(options, flow),
                    EmergencyCommands::Check { step, undo } => {
                        emergency::run_check(options, &step, !undo)
                    }
                    EmergencyCommands::Note { step, text } => {
                        emergency::run_note(options, &step, &text)
                    }
                    EmergencyCommands::End => emergency::run_end(options),
                    EmergencyCommands::History => emergency::run_history(options),
                }
            }
        }
    }
}
