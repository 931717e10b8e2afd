//! Environment and file ingestion.
//!
//! A [`Loader`] turns the process environment or `KEY=VALUE` files into
//! [`Entry`] values. It never touches a store itself; the `Config` applies
//! entries through the same `set` path ordinary callers use, so every key is
//! validated the same way.
//!
//! ## Environment
//! `APP_DB_HOST=localhost` with prefix `APP` becomes `DB.HOST = localhost`:
//! the prefix and its `_` are stripped and the remaining `_` become `.`.
//!
//! ## Files
//! One assignment per line, `KEY=VALUE` or `KEY: VALUE`. Blank lines and
//! lines starting with `#` are skipped. Keys are used as written.
//!
//! ## File indirection
//! A key ending in `_FILE` (or `.FILE`) is not stored. Its value names a file
//! whose trimmed contents become the value of the key without the suffix.

use super::key::SEPARATOR;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Separator between an environment prefix and the key, and between
/// segments inside an environment variable name.
pub const ENV_SPLIT_CHAR: char = '_';

/// Separator for `KEY=VALUE` lines.
pub const ENTRY_SPLIT: &str = "=";

/// Alternative separator for `KEY: VALUE` lines.
pub const ENTRY_SPLIT_ALT: &str = ": ";

/// Key suffix that marks a value as a path to read the real value from.
pub const FILE_SUFFIX: &str = "FILE";

/// A parsed key/value pair, not yet validated or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Entries produced by one load, with the errors of entries that failed.
///
/// A failed entry never aborts the rest of the load.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub entries: Vec<Entry>,
    pub errors: Vec<ConfigError>,
}

impl LoadOutcome {
    fn push(&mut self, parsed: Result<Option<Entry>, ConfigError>) {
        match parsed {
            Ok(Some(entry)) => self.entries.push(entry),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "skipping config entry");
                self.errors.push(err);
            }
        }
    }
}

/// Source of configuration entries.
pub trait Loader: Send + Sync + std::fmt::Debug {
    /// Entries from environment variables starting with one of `prefixes`.
    fn load_env(&self, prefixes: &[String]) -> LoadOutcome;

    /// Entries from `KEY=VALUE` / `KEY: VALUE` files.
    fn load_files(&self, paths: &[PathBuf]) -> LoadOutcome;
}

/// Loader reading the process environment and the local filesystem.
///
/// The environment can be replaced by a fixed snapshot with
/// [`DefaultLoader::with_env`].
#[derive(Debug, Clone, Default)]
pub struct DefaultLoader {
    env: Option<Vec<(String, String)>>,
}

impl DefaultLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `vars` instead of the process environment.
    pub fn with_env<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn env_vars(&self) -> Vec<(String, String)> {
        match &self.env {
            Some(vars) => vars.clone(),
            None => std::env::vars_os()
                .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
                    (Ok(k), Ok(v)) => Some((k, v)),
                    (k, _) => {
                        debug!(name = ?k, "skipping non-UTF-8 environment variable");
                        None
                    }
                })
                .collect(),
        }
    }
}

impl Loader for DefaultLoader {
    fn load_env(&self, prefixes: &[String]) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        for (name, value) in self.env_vars() {
            outcome.push(parse_env_var(&name, &value, prefixes));
        }
        debug!(
            prefixes = ?prefixes,
            entries = outcome.entries.len(),
            errors = outcome.errors.len(),
            "environment scanned"
        );
        outcome
    }

    fn load_files(&self, paths: &[PathBuf]) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        for path in paths {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(source) => {
                    outcome.push(Err(ConfigError::Read {
                        path: path.clone(),
                        source,
                    }));
                    continue;
                }
            };
            let source_name = path.display().to_string();
            for (i, line) in content.lines().enumerate() {
                outcome.push(parse_file_line(&source_name, i + 1, line));
            }
            debug!(path = %source_name, "config file scanned");
        }
        outcome
    }
}

/// Parse one environment variable against the prefix list.
///
/// Returns `Ok(None)` for variables outside every prefix.
pub fn parse_env_var(
    name: &str,
    value: &str,
    prefixes: &[String],
) -> Result<Option<Entry>, ConfigError> {
    let Some(rest) = prefixes.iter().find_map(|prefix| {
        name.strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix(ENV_SPLIT_CHAR))
    }) else {
        return Ok(None);
    };
    if rest.is_empty() {
        return Err(ConfigError::InvalidEntry {
            source_name: "environment".to_string(),
            line: 0,
            entry: name.to_string(),
        });
    }
    let key = rest.replace(ENV_SPLIT_CHAR, &SEPARATOR.to_string());
    resolve_indirection(key, value.to_string()).map(Some)
}

/// Parse one line of a config file.
///
/// Returns `Ok(None)` for blank lines and comments. A line is split at its
/// first `=`; lines without `=` are split at their first `: `.
pub fn parse_file_line(
    source_name: &str,
    line_no: usize,
    line: &str,
) -> Result<Option<Entry>, ConfigError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let invalid = || ConfigError::InvalidEntry {
        source_name: source_name.to_string(),
        line: line_no,
        entry: line.to_string(),
    };
    let (key, value) = trimmed
        .split_once(ENTRY_SPLIT)
        .or_else(|| trimmed.split_once(ENTRY_SPLIT_ALT))
        .ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }
    resolve_indirection(key.to_string(), value.trim().to_string()).map(Some)
}

/// Replace a `_FILE` entry by the contents of the file it names.
fn resolve_indirection(key: String, value: String) -> Result<Entry, ConfigError> {
    let Some(stripped) = strip_file_suffix(&key) else {
        return Ok(Entry { key, value });
    };
    let path = Path::new(&value);
    debug!(key = %stripped, path = %path.display(), "loading config value from file");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Entry::new(stripped, content.trim()))
}

/// `SECRET_FILE`, `secret.file` and `SECRET/FILE` all name `SECRET`.
fn strip_file_suffix(key: &str) -> Option<&str> {
    let split = key.len().checked_sub(FILE_SUFFIX.len() + 1)?;
    if !key.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = key.split_at(split);
    let mut tail_chars = tail.chars();
    let sep = tail_chars.next()?;
    let is_sep = sep == ENV_SPLIT_CHAR || sep == SEPARATOR || sep == '/';
    if is_sep && !head.is_empty() && tail_chars.as_str().eq_ignore_ascii_case(FILE_SUFFIX) {
        Some(head)
    } else {
        None
    }
}
