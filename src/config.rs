//! Configuration loading and management
//!
//! Handles parsing of `lifeops.toml` from the data directory.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::validate_key;

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "lifeops.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "LIFEOPS_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Storage-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key names for each persisted collection
    #[serde(default)]
    pub keys: StorageKeys,
}

/// Key names, one per store component.
///
/// Each key is written by exactly one component, so all five must differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    #[serde(default = "default_legacy_tasks_key")]
    pub legacy_tasks: String,

    #[serde(default = "default_daily_instances_key")]
    pub daily_instances: String,

    #[serde(default = "default_templates_key")]
    pub templates: String,

    #[serde(default = "default_emergency_flows_key")]
    pub emergency_flows: String,

    #[serde(default = "default_emergency_runs_key")]
    pub emergency_runs: String,
}

fn default_legacy_tasks_key() -> String {
    "life_ops_v01_daily_tasks".to_string()
}

fn default_daily_instances_key() -> String {
    "life_ops_v02_daily_instances".to_string()
}

fn default_templates_key() -> String {
    "life_ops_v01_templates".to_string()
}

fn default_emergency_flows_key() -> String {
    "life_ops_v01_emergency_flows".to_string()
}

fn default_emergency_runs_key() -> String {
    "life_ops_v01_emergency_runs".to_string()
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            legacy_tasks: default_legacy_tasks_key(),
            daily_instances: default_daily_instances_key(),
            templates: default_templates_key(),
            emergency_flows: default_emergency_flows_key(),
            emergency_runs: default_emergency_runs_key(),
        }
    }
}

impl StorageKeys {
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("legacy_tasks", self.legacy_tasks.as_str()),
            ("daily_instances", self.daily_instances.as_str()),
            ("templates", self.templates.as_str()),
            ("emergency_flows", self.emergency_flows.as_str()),
            ("emergency_runs", self.emergency_runs.as_str()),
        ]
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (field, key) in self.entries() {
            validate_key(key).map_err(|err| {
                Error::InvalidConfig(format!("storage.keys.{field}: {err}"))
            })?;
            if !seen.insert(key) {
                return Err(Error::InvalidConfig(format!(
                    "storage.keys.{field} reuses key '{key}'"
                )));
            }
        }
        Ok(())
    }
}

/// Default titles for records created without one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Title of a new manual check task
    #[serde(default = "default_check_title")]
    pub check_title: String,

    /// Title of a new manual number task
    #[serde(default = "default_number_title")]
    pub number_title: String,

    /// Title of a new check template
    #[serde(default = "default_template_check_title")]
    pub template_check_title: String,

    /// Title of a new number template
    #[serde(default = "default_template_number_title")]
    pub template_number_title: String,

    /// Title given to migrated legacy tasks that had none
    #[serde(default = "default_legacy_title")]
    pub legacy_title: String,
}

fn default_check_title() -> String {
    "New check task".to_string()
}

fn default_number_title() -> String {
    "New number task".to_string()
}

fn default_template_check_title() -> String {
    "Daily template (check)".to_string()
}

fn default_template_number_title() -> String {
    "Daily template (number)".to_string()
}

fn default_legacy_title() -> String {
    "Task".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            check_title: default_check_title(),
            number_title: default_number_title(),
            template_check_title: default_template_check_title(),
            template_number_title: default_template_number_title(),
            legacy_title: default_legacy_title(),
        }
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        let titles = [
            ("check_title", &self.check_title),
            ("number_title", &self.number_title),
            ("template_check_title", &self.template_check_title),
            ("template_number_title", &self.template_number_title),
            ("legacy_title", &self.legacy_title),
        ];
        for (field, title) in titles {
            if title.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("tasks.{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `lifeops.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.storage.keys.validate()?;
        self.tasks.validate()?;
        Ok(())
    }
}

/// Pick the data directory: explicit flag/env value, else the platform
/// data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    directories::ProjectDirs::from("", "", "lifeops")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "cannot determine a data directory; pass --data-dir or set {DATA_DIR_ENV}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.keys.legacy_tasks, "life_ops_v01_daily_tasks");
        assert_eq!(cfg.storage.keys.daily_instances, "life_ops_v02_daily_instances");
        assert_eq!(cfg.storage.keys.templates, "life_ops_v01_templates");
        assert_eq!(cfg.storage.keys.emergency_flows, "life_ops_v01_emergency_flows");
        assert_eq!(cfg.storage.keys.emergency_runs, "life_ops_v01_emergency_runs");
        assert_eq!(cfg.tasks.check_title, "New check task");
        assert_eq!(cfg.tasks.legacy_title, "Task");
        cfg.validate().expect("defaults validate");
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[storage.keys]
templates = "my_templates"
emergency_runs = "my-runs"

[tasks]
legacy_title = "Imported"
"#;
        fs::write(&path, content).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.storage.keys.templates, "my_templates");
        assert_eq!(cfg.storage.keys.emergency_runs, "my-runs");
        assert_eq!(cfg.storage.keys.legacy_tasks, "life_ops_v01_daily_tasks");
        assert_eq!(cfg.tasks.legacy_title, "Imported");
        assert_eq!(cfg.tasks.number_title, "New number task");
    }

    #[test]
    fn shared_keys_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
[storage.keys]
legacy_tasks = "life_ops_v01_daily_tasks"
daily_instances = "life_ops_v01_daily_tasks"
"#,
        )
        .expect("write config");

        let err = Config::load(&path).expect_err("shared key");
        match err {
            Error::InvalidConfig(message) => assert!(message.contains("daily_instances")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_key_and_empty_title_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);

        fs::write(&path, "[storage.keys]\ntemplates = \"../x\"\n").expect("write");
        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));

        fs::write(&path, "[tasks]\ncheck_title = \"  \"\n").expect("write");
        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("defaults");
        assert_eq!(cfg.storage.keys, StorageKeys::default());
    }

    #[test]
    fn resolve_data_dir_prefers_explicit() {
        let dir = PathBuf::from("/tmp/lifeops-explicit");
        assert_eq!(resolve_data_dir(Some(dir.clone())).expect("dir"), dir);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("daily_instances = \"life_ops_v02_daily_instances\""));

        let reloaded = Config::load(&path).expect("reload");
        assert_eq!(reloaded.storage.keys, StorageKeys::default());
    }
}
