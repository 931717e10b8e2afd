//! Concurrency-safe flat key/value storage.
//!
//! One `RwLock` guards the whole map. Every operation takes the lock for its
//! own duration only: a single write for `set`, a single scan for the reads.
//! Multi-key operations built on top of this (merge, compare, loading) are
//! sequences of independent critical sections.

use super::key::{self, SEPARATOR};
use super::tree::{self, FlatMap};
use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Result of looking up a key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key is a stored leaf.
    Scalar(String),
    /// The key is an interior node; entries keyed by suffix below it.
    Tree(FlatMap),
}

/// Flat map of normalized key paths to non-empty string values.
#[derive(Debug, Default)]
pub struct FlatStore {
    entries: RwLock<HashMap<String, String>>,
}

impl FlatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a copy of `flat`, without re-validation.
    ///
    /// Callers pass maps produced by `tree::flatten` or by another store.
    pub(crate) fn from_flat(flat: FlatMap) -> Self {
        Self {
            entries: RwLock::new(flat.into_iter().collect()),
        }
    }

    // The map is only changed by insert, remove and a non-panicking retain,
    // so a panicking reader or writer cannot leave it half-updated.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `key` is stored or is the prefix of a stored key.
    ///
    /// Invalid keys are never present.
    pub fn has(&self, key: &str) -> bool {
        let Ok(key) = key::normalize(key) else {
            return false;
        };
        self.read()
            .keys()
            .any(|k| key::suffix_under(k, &key).is_some())
    }

    /// Look up a key: a leaf value, or the entries below an interior node.
    pub fn lookup(&self, key: &str) -> Result<Lookup> {
        let key = key::normalize(key)?;
        let mut matches = self.get_all_normalized(&key);
        match matches.remove("") {
            Some(value) if matches.is_empty() => Ok(Lookup::Scalar(value)),
            Some(_) => Err(ConfigError::AmbiguousKey(key)),
            None if matches.is_empty() => Err(ConfigError::KeyNotFound(key)),
            None => Ok(Lookup::Tree(matches)),
        }
    }

    /// The scalar value stored at `key`.
    ///
    /// An interior node is not a scalar and yields `FieldNotString`.
    pub fn get(&self, key: &str) -> Result<String> {
        match self.lookup(key)? {
            Lookup::Scalar(value) => Ok(value),
            Lookup::Tree(_) => Err(ConfigError::FieldNotString(key::normalize(key)?)),
        }
    }

    /// Every entry at or below `key`, keyed by the remaining suffix.
    ///
    /// The empty suffix is the key itself. Returns an empty map when nothing
    /// matches or the key is invalid.
    pub fn get_all(&self, key: &str) -> FlatMap {
        match key::normalize(key) {
            Ok(key) => self.get_all_normalized(&key),
            Err(_) => FlatMap::new(),
        }
    }

    fn get_all_normalized(&self, key: &str) -> FlatMap {
        tree::subtree(self.read().iter(), key)
    }

    /// Store `value` at `key`.
    ///
    /// An empty value deletes the key together with everything below it;
    /// deleting an absent key is not an error. An existing key is only
    /// replaced when `force` is set. A key that would be both a leaf and the
    /// prefix of another key is rejected.
    pub fn set(&self, key: &str, value: &str, force: bool) -> Result<()> {
        let key = key::normalize(key)?;
        let mut entries = self.write();

        if value.is_empty() {
            let before = entries.len();
            entries.retain(|k, _| key::suffix_under(k, &key).is_none());
            let removed = before - entries.len();
            if removed > 0 {
                debug!(key = %key, removed, "config key deleted");
            }
            return Ok(());
        }

        if let Some(ancestor) = key::ancestors(&key).find(|a| entries.contains_key(*a)) {
            return Err(ConfigError::invalid_key(
                key.clone(),
                format!("'{}' is already a value", ancestor),
            ));
        }
        let below = format!("{}{}", key, SEPARATOR);
        if entries.keys().any(|k| k.starts_with(&below)) {
            return Err(ConfigError::invalid_key(key, "key already holds nested values"));
        }

        match entries.get_mut(&key) {
            Some(_) if !force => Err(ConfigError::KeyInStore(key)),
            Some(existing) => {
                *existing = value.to_string();
                debug!(key = %key, "config key replaced");
                Ok(())
            }
            None => {
                debug!(key = %key, "config key set");
                entries.insert(key, value.to_string());
                Ok(())
            }
        }
    }

    /// Snapshot of all stored key paths, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Copy of the whole map, taken under a single read lock.
    pub fn snapshot(&self) -> FlatMap {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Clone for FlatStore {
    fn clone(&self) -> Self {
        Self::from_flat(self.snapshot())
    }
}

/// Build a store from an already flattened map, validating every key.
impl TryFrom<FlatMap> for FlatStore {
    type Error = ConfigError;

    fn try_from(flat: FlatMap) -> Result<Self> {
        let store = FlatStore::new();
        for (key, value) in &flat {
            store.set(key, value, false)?;
        }
        Ok(store)
    }
}
