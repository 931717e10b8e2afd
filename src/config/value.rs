//! Typed configuration values used at ingestion and read boundaries.
//!
//! The store itself only holds strings. `ConfigValue` is how nested initial
//! values come in and how sub-trees are handed back out.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A nested map of configuration values.
pub type ValueMap = BTreeMap<String, ConfigValue>;

/// A configuration value: a scalar or a nested map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(ValueMap),
}

impl ConfigValue {
    /// Whether this value is a nested map.
    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    /// The stored string form of a scalar. `None` for maps.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            ConfigValue::Bool(b) => Some(b.to_string()),
            ConfigValue::Int(i) => Some(i.to_string()),
            ConfigValue::Float(f) => Some(f.to_string()),
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::Map(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert a JSON value, naming `key` in the error for unsupported
    /// leaves (arrays and nulls).
    pub fn from_json(key: &str, value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(ConfigValue::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ConfigValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(ConfigValue::Float(f))
                } else {
                    Err(ConfigError::invalid_value(key, format!("number out of range: {}", n)))
                }
            }
            Value::String(s) => Ok(ConfigValue::String(s)),
            Value::Object(map) => {
                let mut out = ValueMap::new();
                for (k, v) in map {
                    let child_key = if key.is_empty() {
                        k.clone()
                    } else {
                        format!("{}.{}", key, k)
                    };
                    let child = ConfigValue::from_json(&child_key, v)?;
                    out.insert(k, child);
                }
                Ok(ConfigValue::Map(out))
            }
            Value::Array(_) => Err(ConfigError::invalid_value(key, "arrays are not supported")),
            Value::Null => Err(ConfigError::invalid_value(key, "null is not supported")),
        }
    }
}

impl TryFrom<Value> for ConfigValue {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self> {
        ConfigValue::from_json("", value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Map(_) => match serde_json::to_string(self) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => Err(fmt::Error),
            },
            scalar => write!(f, "{}", scalar.to_scalar_string().unwrap_or_default()),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(i)
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Int(i64::from(i))
    }
}

impl From<u32> for ConfigValue {
    fn from(i: u32) -> Self {
        ConfigValue::Int(i64::from(i))
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Float(f)
    }
}

impl From<ValueMap> for ConfigValue {
    fn from(m: ValueMap) -> Self {
        ConfigValue::Map(m)
    }
}

/// Build a [`ValueMap`] from `key => value` pairs.
///
/// ```
/// use config_tree::values;
///
/// let defaults = values! {
///     "log" => values! { "level" => "info", "json" => false },
///     "workers" => 4,
/// };
/// assert_eq!(defaults.len(), 2);
/// ```
#[macro_export]
macro_rules! values {
    () => { $crate::config::ValueMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::config::ValueMap::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::config::ConfigValue::from($value),
            );
        )+
        map
    }};
}
