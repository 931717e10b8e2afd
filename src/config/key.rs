//! Key path validation and normalization.
//!
//! A key path is one or more segments joined by [`SEPARATOR`]. Segments are
//! drawn from `[A-Za-z0-9_-]` and are upper-cased on every entry point, so
//! `db.Host` and `DB.HOST` address the same value. `/` is accepted on input
//! as an alternative separator.

use crate::error::{ConfigError, Result};

/// Canonical key path separator.
pub const SEPARATOR: char = '.';

/// Alternative separator accepted on input and rewritten to [`SEPARATOR`].
pub const ALT_SEPARATOR: char = '/';

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Validate a raw key path and return its normalized form.
pub fn normalize(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid_key(raw, "key is empty"));
    }

    let mut normalized = String::with_capacity(trimmed.len());
    for (i, segment) in trimmed.split([SEPARATOR, ALT_SEPARATOR]).enumerate() {
        if segment.is_empty() {
            return Err(ConfigError::invalid_key(raw, "empty segment"));
        }
        if let Some(bad) = segment.chars().find(|c| !is_key_char(*c)) {
            return Err(ConfigError::invalid_key(
                raw,
                format!("invalid character '{}'", bad),
            ));
        }
        if i > 0 {
            normalized.push(SEPARATOR);
        }
        normalized.push_str(&segment.to_ascii_uppercase());
    }
    Ok(normalized)
}

/// Join two normalized paths. An empty `prefix` yields `suffix` unchanged.
pub fn join(prefix: &str, suffix: &str) -> String {
    match (prefix.is_empty(), suffix.is_empty()) {
        (true, _) => suffix.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}{}{}", prefix, SEPARATOR, suffix),
    }
}

/// The remainder of `key` below `prefix`, if `key` lies under it.
///
/// Returns `Some("")` for an exact match and `Some(rest)` when `key` is
/// `prefix` followed by the separator. `AB` is not under `A`.
pub fn suffix_under<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = key.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(SEPARATOR)
    }
}

/// Every proper ancestor of a normalized path, shortest first.
///
/// `A.B.C` yields `A` and `A.B`.
pub fn ancestors(key: &str) -> impl Iterator<Item = &str> {
    key.match_indices(SEPARATOR).map(move |(i, _)| &key[..i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_normalize_uppercases_and_joins() {
        assert_eq!(normalize("db.Host").unwrap(), "DB.HOST");
        assert_eq!(normalize("nested/other/number").unwrap(), "NESTED.OTHER.NUMBER");
        assert_eq!(normalize("  simple ").unwrap(), "SIMPLE");
        assert_eq!(normalize("log_level-2").unwrap(), "LOG_LEVEL-2");
    }

    #[test]
    fn test_normalize_rejects_malformed_keys() {
        for raw in ["", "   ", "a..b", ".a", "a.", "a/", "a b", "a.b$", "ü"] {
            let err = normalize(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidKey, "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_suffix_under_respects_segment_boundaries() {
        assert_eq!(suffix_under("A.B", "A"), Some("B"));
        assert_eq!(suffix_under("A", "A"), Some(""));
        assert_eq!(suffix_under("AB", "A"), None);
        assert_eq!(suffix_under("B.A", "A"), None);
    }

    #[test]
    fn test_ancestors() {
        let found: Vec<&str> = ancestors("A.B.C").collect();
        assert_eq!(found, vec!["A", "A.B"]);
        assert_eq!(ancestors("A").count(), 0);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("A", "B.C"), "A.B.C");
        assert_eq!(join("", "B"), "B");
        assert_eq!(join("A", ""), "A");
    }
}
