//! Output for lifeops commands.
//!
//! `--json` prints one envelope per invocation, the same shape for success
//! and failure. Otherwise a header line is followed by the non-empty
//! sections of a [`HumanOutput`].

use std::fmt;

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "lifeops.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Summary,
    Details,
    Warnings,
    NextSteps,
}

impl Section {
    const ALL: [Section; 4] = [
        Section::Summary,
        Section::Details,
        Section::Warnings,
        Section::NextSteps,
    ];

    fn title(self) -> &'static str {
        match self {
            Section::Summary => "Summary",
            Section::Details => "Details",
            Section::Warnings => "Warnings",
            Section::NextSteps => "Next steps",
        }
    }
}

/// Plain-text result of a command; warnings and next steps also go into
/// the JSON envelope.
#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    entries: Vec<(Section, String)>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            entries: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        let line = if value.is_empty() { key } else { format!("{key}: {value}") };
        self.entries.push((Section::Summary, line));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.entries.push((Section::Details, value.into()));
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.entries.push((Section::Warnings, value.into()));
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.entries.push((Section::NextSteps, value.into()));
    }

    fn section(&self, section: Section) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(s, _)| *s == section)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;
        for section in Section::ALL {
            let lines = self.section(section);
            if lines.is_empty() {
                continue;
            }
            write!(f, "\n\n{}:", section.title())?;
            for line in lines {
                write!(f, "\n- {line}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

impl<T: Serialize> Envelope<'_, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let section = |s| human.map(|h| h.section(s)).unwrap_or_default();
        return Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            data: Some(data),
            error: None,
            warnings: section(Section::Warnings),
            next_steps: section(Section::NextSteps),
        }
        .print();
    }

    match human {
        Some(human) if !options.quiet => println!("{human}"),
        _ => {}
    }
    Ok(())
}

/// Report a failed command: the error envelope on stdout with `--json`,
/// otherwise the message and first hint on stderr.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        return Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            }),
            warnings: Vec::new(),
            next_steps,
        }
        .print();
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Command name for error envelopes, taken from raw args so it is
/// available even when clap rejects them.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

/// Global options that take a separate value argument
const VALUE_OPTIONS: &[&str] = &["--data-dir"];

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut positional = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if VALUE_OPTIONS.contains(&arg.as_str()) {
            args.next();
        } else if !arg.starts_with('-') {
            positional.push(arg);
        }
    }
    let mut args = positional.into_iter();

    let command = match args.next() {
        Some(cmd) => cmd,
        None => return "lifeops".to_string(),
    };

    if matches!(command.as_str(), "task" | "template" | "emergency") {
        if let Some(sub) = args.next() {
            return format!("{command} {sub}");
        }
    }

    command
}

/// Render a ratio for humans; non-finite values show as a dash
pub fn format_ratio(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.3}")
    } else {
        "-".to_string()
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::RunActive(_) => vec![
            "lifeops emergency status".to_string(),
            "lifeops emergency end".to_string(),
        ],
        Error::NoActiveRun => vec!["lifeops emergency start".to_string()],
        Error::NotFound { kind: "template", .. } => vec!["lifeops template ls".to_string()],
        Error::NotFound { kind: "task", .. } => vec!["lifeops today".to_string()],
        Error::NotFound { kind: "step", .. } => vec!["lifeops emergency status".to_string()],
        Error::NotFound { kind: "flow", .. } => vec!["lifeops emergency flows".to_string()],
        Error::InvalidConfig(_) => vec!["fix lifeops.toml then retry".to_string()],
        Error::LockFailed(_) => vec!["retry once the other lifeops process exits".to_string()],
        _ => Vec::new(),
    }
}
