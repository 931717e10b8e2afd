//! Text renderings of a configuration and file dumps.

use crate::config::{Config, ConfigValue, ValueMap};
use crate::error::{ConfigError, Result};
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Output format for dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    /// Flat `KEY=VALUE` lines.
    Env,
    /// Nested, indented `KEY: VALUE` blocks.
    Txt,
    /// Nested JSON object of strings.
    Json,
}

impl DumpFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DumpFormat::Env => "env",
            DumpFormat::Txt => "txt",
            DumpFormat::Json => "json",
        }
    }
}

impl FromStr for DumpFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "env" => Ok(DumpFormat::Env),
            "txt" | "text" => Ok(DumpFormat::Txt),
            "json" => Ok(DumpFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat(s.to_string())),
        }
    }
}

const INDENT: &str = "  ";

fn write_nested(out: &mut String, map: &ValueMap, depth: usize) {
    for (key, value) in map {
        let pad = INDENT.repeat(depth);
        match value {
            ConfigValue::Map(child) => {
                let _ = writeln!(out, "{}{}:", pad, key);
                write_nested(out, child, depth + 1);
            }
            scalar => {
                let _ = writeln!(out, "{}{}: {}", pad, key, scalar);
            }
        }
    }
}

impl Config {
    /// The nested view as indented `KEY: VALUE` text.
    pub fn sprint(&self) -> String {
        let mut out = String::new();
        write_nested(&mut out, &self.to_map(), 0);
        out
    }

    /// One `KEY=VALUE` line per stored entry, sorted by key.
    ///
    /// A value containing a line break has no single-line form and fails
    /// with `MultilineValue`.
    pub fn to_env(&self) -> Result<String> {
        let mut out = String::new();
        for (key, value) in self.to_flat() {
            if value.contains(['\n', '\r']) {
                return Err(ConfigError::MultilineValue {
                    key,
                    format: DumpFormat::Env.as_str(),
                });
            }
            let _ = writeln!(out, "{}={}", key, value);
        }
        Ok(out)
    }

    /// The nested view as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_map())?)
    }

    /// Render in `format`.
    pub fn render(&self, format: DumpFormat) -> Result<String> {
        match format {
            DumpFormat::Env => self.to_env(),
            DumpFormat::Txt => Ok(self.sprint()),
            DumpFormat::Json => self.to_json(),
        }
    }

    /// Write the configuration to `path` in the named format
    /// (`env`, `txt` or `json`). The file is created or truncated.
    pub fn dump_to_file(&self, format: &str, path: impl AsRef<Path>) -> Result<()> {
        let format: DumpFormat = format.parse()?;
        let path = path.as_ref();
        let rendered = self.render(format)?;
        std::fs::write(path, rendered).map_err(|source| ConfigError::Dump {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), format = format.as_str(), "config dumped");
        Ok(())
    }
}
