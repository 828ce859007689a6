#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Throwaway lifeops data directory
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.dir.path().join(format!("{key}.json"))
    }

    pub fn write_key(&self, key: &str, contents: &str) {
        fs::write(self.key_path(key), contents).expect("write key");
    }

    pub fn read_key(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    pub fn read_json(&self, key: &str) -> Value {
        let raw = self.read_key(key).expect("key present");
        serde_json::from_str(&raw).expect("valid json")
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.dir.path().join("lifeops.toml"), contents).expect("write config");
    }

    /// `lifeops --data-dir <dir>` with logging off
    pub fn cmd(&self) -> Command {
        let mut cmd = lifeops_cmd();
        cmd.arg("--data-dir").arg(self.path());
        cmd
    }

    /// Run with `--json` and return the parsed envelope
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run lifeops");
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }
}

pub fn lifeops_cmd() -> Command {
    let mut cmd = Command::cargo_bin("lifeops").expect("binary");
    cmd.env_remove("LIFEOPS_DIR").env_remove("RUST_LOG");
    cmd
}
