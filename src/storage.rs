//! Storage layer for lifeops
//!
//! All state lives in a flat key-value namespace of JSON-encoded arrays.
//! The [`KeyValueStore`] trait is the only thing the stores depend on;
//! [`FileStore`] persists one file per key, [`MemoryStore`] keeps
//! everything in process.
//!
//! # Directory Structure
//!
//! ```text
//! <data_dir>/
//!   lifeops.toml                          # Optional configuration
//!   life_ops_v01_templates.json           # One file per key
//!   life_ops_v01_templates.json.lock      # Writer lock
//!   life_ops_v02_daily_instances.json
//!   ...
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::error::{Error, ParseError, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Extension used for key files
const KEY_FILE_EXTENSION: &str = "json";

/// Synchronous string storage addressed by key.
///
/// No transactions and no expiry; a `set` fully replaces the value.
pub trait KeyValueStore {
    /// Read the raw value for `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the raw value for `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Check that a key can be used as a file name
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("storage key cannot be empty".to_string()));
    }
    if key.starts_with('.') {
        return Err(Error::InvalidArgument(format!(
            "storage key cannot start with '.': {key}"
        )));
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
    {
        return Err(Error::InvalidArgument(format!(
            "storage key must be ASCII alphanumeric, '_', '-' or '.': {key}"
        )));
    }
    Ok(())
}

// =============================================================================
// File-backed store
// =============================================================================

/// One JSON file per key under a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Data directory holding the key files
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`
    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{KEY_FILE_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        lock::write_atomic_locked(&path, value.as_bytes(), self.lock_timeout_ms)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store, used by tests and embedders
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing any encoding
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::OperationFailed("memory store poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::OperationFailed("memory store poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Collection codec
// =============================================================================

/// Decode a stored JSON array record by record.
///
/// Only a value that is not JSON, or not an array, fails as a whole. An
/// element that does not decode is skipped with a warning so the rest of
/// the list survives; record types pair this with [`lenient`] fields so
/// that only non-object elements are ever skipped.
pub fn parse_collection<T: DeserializeOwned>(
    raw: &str,
) -> std::result::Result<Vec<T>, ParseError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(ParseError::Syntax)?;
    let serde_json::Value::Array(items) = value else {
        return Err(ParseError::NotAnArray);
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(record) => records.push(record),
            Err(err) => tracing::warn!(index, error = %err, "skipping undecodable record"),
        }
    }
    Ok(records)
}

/// Field decoder mapping `null` or a mistyped value to the field's default.
///
/// Use with `#[serde(default, deserialize_with = "lenient")]` so a record
/// with one odd field still loads.
pub fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Load a collection, recovering missing or undecodable data as empty.
///
/// Read failures are recovered the same way; only writes surface errors.
pub fn load_or_empty<T, S>(store: &S, key: &str) -> Vec<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read stored collection; using empty");
            return Vec::new();
        }
    };

    if raw.is_empty() {
        return Vec::new();
    }

    match parse_collection(&raw) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding undecodable collection; using empty");
            Vec::new()
        }
    }
}

/// Encode and write a collection, replacing the stored value
pub fn save_collection<T, S>(store: &S, key: &str, records: &[T]) -> Result<()>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(records)?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    fn item(id: &str) -> Item {
        Item { id: id.to_string() }
    }

    #[test]
    fn parse_collection_fails_only_on_non_arrays() {
        assert!(matches!(
            parse_collection::<Item>("{not json"),
            Err(ParseError::Syntax(_))
        ));
        assert!(matches!(
            parse_collection::<Item>(r#"{"id":"a"}"#),
            Err(ParseError::NotAnArray)
        ));
        assert_eq!(
            parse_collection::<Item>(r#"[{"id":"a"}]"#).expect("parse"),
            vec![item("a")]
        );
    }

    #[test]
    fn parse_collection_skips_only_the_bad_element() {
        let parsed = parse_collection::<Item>(r#"[{"id":"a"},{"name":"x"},7,{"id":"b"}]"#)
            .expect("parse");
        assert_eq!(parsed, vec![item("a"), item("b")]);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Loose {
        #[serde(default, deserialize_with = "lenient")]
        count: f64,
        #[serde(default, deserialize_with = "lenient")]
        label: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        flag: bool,
    }

    #[test]
    fn lenient_fields_default_null_and_mistyped_values() {
        let parsed = parse_collection::<Loose>(
            r#"[{"count":null,"label":3,"flag":"yes"},{"count":2.5,"label":"kg","flag":true},{}]"#,
        )
        .expect("parse");

        assert_eq!(
            parsed,
            vec![
                Loose { count: 0.0, label: None, flag: false },
                Loose { count: 2.5, label: Some("kg".to_string()), flag: true },
                Loose { count: 0.0, label: None, flag: false },
            ]
        );
    }

    #[test]
    fn load_or_empty_recovers_missing_and_corrupt() {
        let store = MemoryStore::new()
            .with_entry("corrupt", "[{")
            .with_entry("object", "{}")
            .with_entry("blank", "");

        assert!(load_or_empty::<Item, _>(&store, "missing").is_empty());
        assert!(load_or_empty::<Item, _>(&store, "corrupt").is_empty());
        assert!(load_or_empty::<Item, _>(&store, "object").is_empty());
        assert!(load_or_empty::<Item, _>(&store, "blank").is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let store = MemoryStore::new();
        save_collection(&store, "items", &[item("b"), item("a")]).expect("save");

        let loaded: Vec<Item> = load_or_empty(&store, "items");
        assert_eq!(loaded, vec![item("b"), item("a")]);
    }

    #[test]
    fn file_store_get_missing_is_none() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("nothing_here").expect("get"), None);
    }

    #[test]
    fn file_store_writes_one_file_per_key() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("data"));

        store.set("life_ops_v01_templates", "[]").expect("set");

        let path = dir.path().join("data").join("life_ops_v01_templates.json");
        assert_eq!(fs::read_to_string(path).expect("read"), "[]");
        assert_eq!(
            store.get("life_ops_v01_templates").expect("get").as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        assert!(store.set("../escape", "[]").is_err());
        assert!(store.set("", "[]").is_err());
        assert!(store.get("a/b").is_err());
    }
}
