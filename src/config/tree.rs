//! Conversion between the flat stored form and the nested view.
//!
//! The store keeps one string per full key path. These functions present that
//! flat map as a tree and back:
//! - `flatten` walks a nested map and joins every leaf path
//! - `nest` groups flat keys by their first segment, recursively
//! - `subtree` extracts the entries below a prefix, re-based

use super::key::{self, SEPARATOR};
use super::value::{ConfigValue, ValueMap};
use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;

/// Flat map of normalized key paths to scalar strings.
pub type FlatMap = BTreeMap<String, String>;

/// Flatten a nested map into normalized key paths.
///
/// Keys inside the map may themselves contain separators (`"nested/string"`).
/// Empty-string leaves are dropped, since storing `""` means deletion.
/// A path produced twice, or a leaf that is also the prefix of another leaf,
/// is ambiguous and rejected.
pub fn flatten(nested: &ValueMap) -> Result<FlatMap> {
    let mut flat = FlatMap::new();
    flatten_into("", nested, &mut flat)?;
    check_unambiguous(&flat)?;
    Ok(flat)
}

/// Flatten a single value rooted at `prefix` (already normalized).
pub fn flatten_value(prefix: &str, value: &ConfigValue) -> Result<FlatMap> {
    let mut flat = FlatMap::new();
    match value {
        ConfigValue::Map(map) => flatten_into(prefix, map, &mut flat)?,
        scalar => insert_leaf(prefix, scalar, &mut flat)?,
    }
    check_unambiguous(&flat)?;
    Ok(flat)
}

fn flatten_into(prefix: &str, nested: &ValueMap, flat: &mut FlatMap) -> Result<()> {
    for (raw_key, value) in nested {
        let path = key::join(prefix, &key::normalize(raw_key)?);
        match value {
            ConfigValue::Map(child) => flatten_into(&path, child, flat)?,
            scalar => insert_leaf(&path, scalar, flat)?,
        }
    }
    Ok(())
}

fn insert_leaf(path: &str, scalar: &ConfigValue, flat: &mut FlatMap) -> Result<()> {
    let Some(value) = scalar.to_scalar_string() else {
        return Ok(());
    };
    if value.is_empty() {
        return Ok(());
    }
    if flat.insert(path.to_string(), value).is_some() {
        return Err(ConfigError::invalid_key(path, "defined more than once"));
    }
    Ok(())
}

/// Reject a flat map in which a leaf is also the prefix of another leaf.
fn check_unambiguous(flat: &FlatMap) -> Result<()> {
    for path in flat.keys() {
        if let Some(ancestor) = key::ancestors(path).find(|a| flat.contains_key(*a)) {
            return Err(ConfigError::invalid_key(
                path.clone(),
                format!("'{}' is already a value", ancestor),
            ));
        }
    }
    Ok(())
}

/// Rebuild the nested view from a flat map.
///
/// A key with no segments left after its group prefix becomes a scalar entry,
/// not a one-entry map.
pub fn nest(flat: &FlatMap) -> ValueMap {
    let mut groups: BTreeMap<&str, FlatMap> = BTreeMap::new();
    let mut nested = ValueMap::new();

    for (path, value) in flat {
        match path.split_once(SEPARATOR) {
            Some((head, rest)) => {
                groups
                    .entry(head)
                    .or_default()
                    .insert(rest.to_string(), value.clone());
            }
            None => {
                nested.insert(path.clone(), ConfigValue::String(value.clone()));
            }
        }
    }

    for (head, children) in groups {
        // An ambiguous leaf/prefix pair keeps the leaf. The store never holds one.
        nested
            .entry(head.to_string())
            .or_insert_with(|| ConfigValue::Map(nest(&children)));
    }
    nested
}

/// Entries at or below `prefix`, keyed by their remaining suffix.
///
/// Takes any flat iteration of paths and values, so the store can run it on
/// its guarded map. An exact match is keyed by the empty string.
pub fn subtree<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a String)>,
    prefix: &str,
) -> FlatMap {
    entries
        .into_iter()
        .filter_map(|(path, value)| {
            key::suffix_under(path, prefix).map(|rest| (rest.to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::values;

    fn flat(pairs: &[(&str, &str)]) -> FlatMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_flatten_nested_map() {
        let nested = values! {
            "test" => "abcde",
            "nested" => values! {
                "string" => "nestedTestValue",
                "other" => values! { "number" => 123456 },
            },
        };
        let expected = flat(&[
            ("TEST", "abcde"),
            ("NESTED.STRING", "nestedTestValue"),
            ("NESTED.OTHER.NUMBER", "123456"),
        ]);
        assert_eq!(flatten(&nested).unwrap(), expected);
    }

    #[test]
    fn test_flatten_accepts_path_keys() {
        let nested = values! {
            "nested/string" => "a",
            "example/test/number" => 234567,
        };
        let expected = flat(&[("NESTED.STRING", "a"), ("EXAMPLE.TEST.NUMBER", "234567")]);
        assert_eq!(flatten(&nested).unwrap(), expected);
    }

    #[test]
    fn test_flatten_drops_empty_leaves() {
        let nested = values! { "a" => "", "b" => "x" };
        assert_eq!(flatten(&nested).unwrap(), flat(&[("B", "x")]));
    }

    #[test]
    fn test_flatten_rejects_case_collisions() {
        let nested = values! { "a" => "1", "A" => "2" };
        assert_eq!(flatten(&nested).unwrap_err().kind(), ErrorKind::InvalidKey);
    }

    #[test]
    fn test_flatten_rejects_leaf_prefix_collision() {
        let nested = values! { "a" => "1", "a/b" => "2" };
        assert_eq!(flatten(&nested).unwrap_err().kind(), ErrorKind::InvalidKey);
    }

    #[test]
    fn test_flatten_rejects_invalid_segment() {
        let nested = values! { "a" => values! { "b c" => "1" } };
        assert_eq!(flatten(&nested).unwrap_err().kind(), ErrorKind::InvalidKey);
    }

    #[test]
    fn test_nest_builds_scalars_and_maps() {
        let nested = nest(&flat(&[("A", "1"), ("B.C", "2"), ("B.D.E", "3")]));
        assert_eq!(nested["A"], ConfigValue::from("1"));
        let b = nested["B"].as_map().unwrap();
        assert_eq!(b["C"], ConfigValue::from("2"));
        assert_eq!(b["D"].as_map().unwrap()["E"], ConfigValue::from("3"));
    }

    #[test]
    fn test_round_trip() {
        let nested = values! {
            "SIMPLE" => "test",
            "OTHERNEST" => values! {
                "STRING" => "nestedOther",
                "TRIPPLENEST" => values! { "STRING" => "deep" },
            },
        };
        assert_eq!(nest(&flatten(&nested).unwrap()), nested);
    }

    #[test]
    fn test_round_trip_normalizes_case() {
        let lower = values! { "db" => values! { "host" => "localhost" } };
        let upper = values! { "DB" => values! { "HOST" => "localhost" } };
        assert_eq!(nest(&flatten(&lower).unwrap()), upper);
    }

    #[test]
    fn test_flatten_of_nest_is_identity() {
        let original = flat(&[("A", "1"), ("B.C", "2"), ("B.D.E", "3")]);
        assert_eq!(flatten(&nest(&original)).unwrap(), original);
    }

    #[test]
    fn test_subtree_rebases() {
        let store = flat(&[("A", "1"), ("AB", "2"), ("A.B", "3"), ("A.C.D", "4")]);
        let sub = subtree(&store, "A");
        assert_eq!(sub, flat(&[("", "1"), ("B", "3"), ("C.D", "4")]));
        assert!(subtree(&store, "Z").is_empty());
    }

    #[test]
    fn test_flatten_value_scalar_root() {
        let out = flatten_value("LOG.LEVEL", &ConfigValue::from("info")).unwrap();
        assert_eq!(out, flat(&[("LOG.LEVEL", "info")]));
    }
}
