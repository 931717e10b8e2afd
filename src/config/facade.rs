//! The configuration object handed to subsystems.
//!
//! `Config` owns one [`FlatStore`] and a pluggable [`Loader`]. Reads present
//! the flat store as a tree on demand; whole-tree operations (merge, compare,
//! copy, sub-tree extraction) are built from single-key store calls.

use super::key;
use super::loader::{DefaultLoader, Entry, Loader};
use super::store::{FlatStore, Lookup};
use super::tree::{self, FlatMap};
use super::value::{ConfigValue, ValueMap};
use crate::error::{ConfigError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Summary of applying loaded entries to a `Config`.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Entries written to the store.
    pub applied: usize,
    /// Entries that could not be parsed, read, or stored.
    pub errors: Vec<ConfigError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail with a single `Load` error if any entry failed.
    pub fn into_result(self) -> Result<usize> {
        if self.errors.is_empty() {
            Ok(self.applied)
        } else {
            Err(ConfigError::Load(self.errors))
        }
    }
}

/// Hierarchical configuration backed by a flat, lock-protected store.
///
/// Keys are case-insensitive paths (`db.host`, `DB/HOST`). Every method takes
/// `&self`; a `Config` can be shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Config {
    pub(super) store: FlatStore,
    loader: Arc<dyn Loader>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create an empty configuration using the [`DefaultLoader`].
    pub fn new() -> Self {
        Self {
            store: FlatStore::new(),
            loader: Arc::new(DefaultLoader::new()),
        }
    }

    /// Create a configuration from a nested map of initial values.
    ///
    /// Fails without returning a partial config if any key is invalid or
    /// ambiguous.
    pub fn from_values(values: &ValueMap) -> Result<Self> {
        let flat = tree::flatten(values)?;
        Ok(Self {
            store: FlatStore::from_flat(flat),
            loader: Arc::new(DefaultLoader::new()),
        })
    }

    /// Create a configuration from a JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match ConfigValue::try_from(value)? {
            ConfigValue::Map(map) => Self::from_values(&map),
            other => Err(ConfigError::invalid_value(
                "",
                format!("expected an object at the root, found '{}'", other),
            )),
        }
    }

    fn from_flat(flat: FlatMap, loader: Arc<dyn Loader>) -> Self {
        Self {
            store: FlatStore::from_flat(flat),
            loader,
        }
    }

    /// Replace the loader used by [`Config::load_env`] and [`Config::load_files`].
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub(crate) fn with_shared_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = loader;
        self
    }

    // ---- Single-key operations ----

    /// Whether `key` is stored, or is the prefix of a stored key.
    pub fn has(&self, key: &str) -> bool {
        self.store.has(key)
    }

    /// The value at `key`: a string for leaves, a nested map for sub-trees.
    pub fn get(&self, key: &str) -> Result<ConfigValue> {
        match self.store.lookup(key)? {
            Lookup::Scalar(value) => Ok(ConfigValue::String(value)),
            Lookup::Tree(entries) => Ok(ConfigValue::Map(tree::nest(&entries))),
        }
    }

    /// Every entry at or below `key`, keyed by suffix. Empty when absent.
    pub fn get_all(&self, key: &str) -> FlatMap {
        self.store.get_all(key)
    }

    /// Store a string value. An empty value deletes the key and any sub-tree
    /// below it.
    pub fn set(&self, key: &str, value: &str, force: bool) -> Result<()> {
        self.store.set(key, value, force)
    }

    /// Store a typed value. Maps are flattened under `key` and each leaf is
    /// set on its own; the first failing leaf stops the operation.
    pub fn set_value(&self, key: &str, value: impl Into<ConfigValue>, force: bool) -> Result<()> {
        let root = key::normalize(key)?;
        let value = value.into();
        if !value.is_map() {
            let raw = value.to_scalar_string().unwrap_or_default();
            return self.store.set(&root, &raw, force);
        }
        for (path, raw) in tree::flatten_value(&root, &value)? {
            self.store.set(&path, &raw, force)?;
        }
        Ok(())
    }

    /// Sorted snapshot of stored key paths.
    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Copy of the flat view.
    pub fn to_flat(&self) -> FlatMap {
        self.store.snapshot()
    }

    /// The nested view of the whole configuration.
    pub fn to_map(&self) -> ValueMap {
        tree::nest(&self.store.snapshot())
    }

    // ---- Whole-tree operations ----

    /// Merge every key of `other` into this config.
    ///
    /// Keys already present are skipped unless `overwrite` is set. Any other
    /// failure stops the merge and is returned as `MergeFailed`; keys merged
    /// before it stay merged.
    pub fn merge(&self, other: &Config, overwrite: bool) -> Result<()> {
        let mut merged = 0usize;
        let mut skipped = 0usize;
        for (key, value) in other.store.snapshot() {
            match self.store.set(&key, &value, overwrite) {
                Ok(()) => merged += 1,
                Err(ConfigError::KeyInStore(_)) => skipped += 1,
                Err(err) => {
                    warn!(key = %key, error = %err, "merge aborted");
                    return Err(ConfigError::MergeFailed(Box::new(err)));
                }
            }
        }
        debug!(merged, skipped, overwrite, "config merged");
        Ok(())
    }

    /// Check that every key of `other` is present here, and with
    /// `value_compare` that the values are equal.
    ///
    /// This is a subset check: keys only present here are ignored.
    pub fn compare(&self, other: &Config, value_compare: bool) -> Result<()> {
        for (key, expected) in other.store.snapshot() {
            match self.store.get_all(&key).remove("") {
                None => return Err(ConfigError::KeyNotFound(key)),
                Some(actual) if value_compare && actual != expected => {
                    return Err(ConfigError::ValueMismatch {
                        key,
                        expected,
                        actual,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Check that every key of a defaults map is present.
    pub fn compare_defaults(&self, defaults: &ValueMap) -> Result<()> {
        self.compare(&Config::from_values(defaults)?, false)
    }

    /// Check that every listed key (leaf or sub-tree) is present.
    pub fn require_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        for key in keys {
            let normalized = key::normalize(key.as_ref())?;
            if !self.store.has(&normalized) {
                return Err(ConfigError::KeyNotFound(normalized));
            }
        }
        Ok(())
    }

    /// An independent duplicate; changes to either side never reach the other.
    pub fn copy(&self) -> Config {
        self.clone()
    }

    /// The sub-tree below `key` as a new, independent config.
    pub fn get_config(&self, key: &str) -> Result<Config> {
        let normalized = key::normalize(key)?;
        match self.store.lookup(&normalized)? {
            Lookup::Tree(entries) => Ok(Self::from_flat(entries, Arc::clone(&self.loader))),
            Lookup::Scalar(_) => Err(ConfigError::FieldNotConfig(normalized)),
        }
    }

    // ---- Loading ----

    /// Load environment variables matching `prefixes` into this config.
    pub fn load_env<S: AsRef<str>>(&self, prefixes: &[S], force: bool) -> LoadReport {
        let prefixes: Vec<String> = prefixes.iter().map(|p| p.as_ref().to_string()).collect();
        let outcome = self.loader.load_env(&prefixes);
        self.apply(outcome.entries, outcome.errors, force)
    }

    /// Load `KEY=VALUE` files into this config.
    pub fn load_files<P: Into<PathBuf> + Clone>(&self, paths: &[P], force: bool) -> LoadReport {
        let paths: Vec<PathBuf> = paths.iter().cloned().map(Into::into).collect();
        let outcome = self.loader.load_files(&paths);
        self.apply(outcome.entries, outcome.errors, force)
    }

    /// Apply entries one by one. A failing entry is recorded and skipped.
    pub fn apply(
        &self,
        entries: Vec<Entry>,
        mut errors: Vec<ConfigError>,
        force: bool,
    ) -> LoadReport {
        let mut applied = 0;
        for entry in entries {
            match self.store.set(&entry.key, &entry.value, force) {
                Ok(()) => applied += 1,
                Err(err) => {
                    warn!(key = %entry.key, error = %err, "config entry not applied");
                    errors.push(err);
                }
            }
        }
        LoadReport { applied, errors }
    }
}
