//! lifeops - personal daily tracker library
//!
//! Core functionality behind the lifeops CLI: dated task instances derived
//! from recurring templates, a day score, one-time migration of legacy
//! task lists, and resumable emergency checklist runs.
//!
//! # Core Concepts
//!
//! - **Templates**: recurring task definitions, derived at most once per day
//! - **Daily instances**: dated tasks, manual or derived, soft-deleted only
//! - **Day score**: mean completion over the day's visible tasks
//! - **Emergency runs**: step states of a checklist flow, persisted per change
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `lifeops.toml`
//! - `error`: Error types and result aliases
//! - `storage`: Key-value persistence of JSON collections
//! - `lock`: File locking and atomic writes for the file store
//! - `clock`: Injectable source of today's date and the current instant
//! - `ids`: Prefixed ULID identifiers and id resolution
//! - `daily` / `template`: record types and their stores
//! - `derive`: template derivation for a date
//! - `scoring`: task completion and day score
//! - `migrate`: legacy task migration
//! - `emergency`: flows, runs and progress
//! - `tracker`: wiring of the stores over one backend
//! - `output`: JSON envelope and human output

pub mod cli;
pub mod clock;
pub mod config;
pub mod daily;
pub mod derive;
pub mod emergency;
pub mod error;
pub mod ids;
pub mod lock;
pub mod migrate;
pub mod output;
pub mod scoring;
pub mod storage;
pub mod template;
pub mod tracker;

pub use error::{Error, Result};
