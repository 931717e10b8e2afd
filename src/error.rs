//! Structured error types for configuration operations.

use serde::Serialize;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Key errors
    InvalidKey,
    KeyNotFound,
    KeyInStore,
    AmbiguousKey,

    // Value errors
    ValueMismatch,
    TypeMismatch,
    InvalidValue,

    // Whole-tree operations
    MergeFailed,
    LoadError,
    DumpError,
}

/// Errors produced by the configuration store, loader and dumps.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("key not in store: {0}")]
    KeyNotFound(String),

    #[error("key already in store: {0}")]
    KeyInStore(String),

    #[error("key is ambiguous: {0}")]
    AmbiguousKey(String),

    #[error("value mismatch for {key}: expected '{expected}', found '{actual}'")]
    ValueMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("field is not a string: {0}")]
    FieldNotString(String),

    #[error("field is not an int: {0}")]
    FieldNotInt(String),

    #[error("field is not a float: {0}")]
    FieldNotFloat(String),

    #[error("field is not a bool: {0}")]
    FieldNotBool(String),

    #[error("field is not a duration: {0}")]
    FieldNotDuration(String),

    #[error("field is not a config: {0}")]
    FieldNotConfig(String),

    #[error("unsupported value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("merge failed: {0}")]
    MergeFailed(#[source] Box<ConfigError>),

    #[error("{source_name}:{line}: invalid entry '{entry}'")]
    InvalidEntry {
        source_name: String,
        line: usize,
        entry: String,
    },

    #[error("reading {path} failed: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("loading config failed with {} error(s): {}", .0.len(), join_errors(.0))]
    Load(Vec<ConfigError>),

    #[error("unsupported dump format: {0}")]
    UnsupportedFormat(String),

    #[error("value of {key} spans several lines and cannot be written as {format}")]
    MultilineValue { key: String, format: &'static str },

    #[error("writing config to file {path} failed: {source}")]
    Dump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing config failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    /// Shorthand for an `InvalidKey` error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// The error category, independent of the offending key or path.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::InvalidKey { .. } => ErrorKind::InvalidKey,
            ConfigError::KeyNotFound(_) => ErrorKind::KeyNotFound,
            ConfigError::KeyInStore(_) => ErrorKind::KeyInStore,
            ConfigError::AmbiguousKey(_) => ErrorKind::AmbiguousKey,
            ConfigError::ValueMismatch { .. } => ErrorKind::ValueMismatch,
            ConfigError::FieldNotString(_)
            | ConfigError::FieldNotInt(_)
            | ConfigError::FieldNotFloat(_)
            | ConfigError::FieldNotBool(_)
            | ConfigError::FieldNotDuration(_)
            | ConfigError::FieldNotConfig(_) => ErrorKind::TypeMismatch,
            ConfigError::InvalidValue { .. } => ErrorKind::InvalidValue,
            ConfigError::MergeFailed(_) => ErrorKind::MergeFailed,
            ConfigError::InvalidEntry { .. } | ConfigError::Read { .. } | ConfigError::Load(_) => {
                ErrorKind::LoadError
            }
            ConfigError::UnsupportedFormat(_)
            | ConfigError::MultilineValue { .. }
            | ConfigError::Dump { .. }
            | ConfigError::Serialize(_) => ErrorKind::DumpError,
        }
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_type_mismatches() {
        assert_eq!(
            ConfigError::FieldNotBool("A".into()).kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            ConfigError::FieldNotDuration("A".into()).kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_load_error_lists_causes() {
        let err = ConfigError::Load(vec![
            ConfigError::KeyInStore("A".into()),
            ConfigError::invalid_key("B..C", "empty segment"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("key already in store: A"));
        assert!(msg.contains("invalid key 'B..C'"));
        assert_eq!(err.kind(), ErrorKind::LoadError);
    }

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::KeyNotFound).unwrap();
        assert_eq!(json, "\"KEY_NOT_FOUND\"");
    }
}
