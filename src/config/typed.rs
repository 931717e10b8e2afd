//! Typed accessors.
//!
//! Values are stored as strings and coerced on read. A value that cannot be
//! coerced fails with the matching `FieldNotX` error naming the key.

use super::facade::Config;
use super::key;
use super::store::Lookup;
use crate::error::{ConfigError, Result};
use std::time::Duration;

impl Config {
    fn scalar(&self, key: &str, not_scalar: fn(String) -> ConfigError) -> Result<(String, String)> {
        let normalized = key::normalize(key)?;
        match self.store.lookup(&normalized)? {
            Lookup::Scalar(value) => Ok((normalized, value)),
            Lookup::Tree(_) => Err(not_scalar(normalized)),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.scalar(key, ConfigError::FieldNotString)
            .map(|(_, value)| value)
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        let (key, raw) = self.scalar(key, ConfigError::FieldNotInt)?;
        raw.trim().parse().map_err(|_| ConfigError::FieldNotInt(key))
    }

    pub fn get_float(&self, key: &str) -> Result<f64> {
        let (key, raw) = self.scalar(key, ConfigError::FieldNotFloat)?;
        raw.trim()
            .parse()
            .map_err(|_| ConfigError::FieldNotFloat(key))
    }

    /// Accepts `yes`/`y`/`1`/`true` and `no`/`n`/`0`/`false`, in any case.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let (key, raw) = self.scalar(key, ConfigError::FieldNotBool)?;
        parse_bool(&raw).ok_or(ConfigError::FieldNotBool(key))
    }

    /// A bare integer is milliseconds; otherwise a duration literal such as
    /// `30s`, `500ms` or `2h30m`.
    pub fn get_duration(&self, key: &str) -> Result<Duration> {
        let (key, raw) = self.scalar(key, ConfigError::FieldNotDuration)?;
        parse_duration(&raw).ok_or(ConfigError::FieldNotDuration(key))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "1" | "true" => Some(true),
        "no" | "n" | "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<u64>() {
        return Some(Duration::from_millis(millis));
    }
    humantime::parse_duration(raw).ok()
}
