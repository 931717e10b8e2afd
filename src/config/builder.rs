//! Tiered construction of a [`Config`].
//!
//! Sources are applied lowest priority first, each tier merged over the one
//! below it with overwrite:
//! 1. **Defaults** - nested maps supplied by the caller
//! 2. **Files** - `KEY=VALUE` files, later files overriding earlier ones
//! 3. **Environment** - variables matching the configured prefixes
//!
//! Required keys are checked last. A build either returns a complete
//! config or an error; there is no partially built result.

use super::facade::{Config, LoadReport};
use super::loader::{DefaultLoader, Loader};
use super::value::ValueMap;
use crate::error::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Caller-supplied defaults (lowest priority)
    Defaults = 0,
    /// `KEY=VALUE` files
    File = 1,
    /// Environment variables (highest priority)
    Environment = 2,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::File => write!(f, "file"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Builder assembling a [`Config`] from defaults, files and the environment.
///
/// ```
/// use config_tree::{ConfigBuilder, DefaultLoader, values};
///
/// let config = ConfigBuilder::new()
///     .defaults(values! { "db" => values! { "host" => "127.0.0.1", "port" => 5432 } })
///     .env_prefix("APP")
///     .loader(DefaultLoader::with_env([("APP_DB_HOST", "db.internal")]))
///     .require("db.host")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.get_string("db.host").unwrap(), "db.internal");
/// assert_eq!(config.get_int("db.port").unwrap(), 5432);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    defaults: Vec<ValueMap>,
    files: Vec<PathBuf>,
    env_prefixes: Vec<String>,
    required: Vec<String>,
    strict: bool,
    loader: Arc<dyn Loader>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            defaults: Vec::new(),
            files: Vec::new(),
            env_prefixes: Vec::new(),
            required: Vec::new(),
            strict: false,
            loader: Arc::new(DefaultLoader::new()),
        }
    }

    /// Add a defaults map. Later maps override earlier ones.
    pub fn defaults(mut self, values: ValueMap) -> Self {
        self.defaults.push(values);
        self
    }

    /// Add a `KEY=VALUE` file. Later files override earlier ones.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Recognize environment variables named `PREFIX_...`.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefixes.push(prefix.into());
        self
    }

    /// Fail the build unless `key` is present once all tiers are applied.
    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Fail the build on any malformed or unreadable entry instead of
    /// skipping it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Use `loader` for the file and environment tiers, and in the built config.
    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Apply every tier and check required keys.
    pub fn build(self) -> Result<Config> {
        let config = Config::new().with_shared_loader(Arc::clone(&self.loader));

        for defaults in &self.defaults {
            let tier = Config::from_values(defaults)?;
            self.merge_tier(&config, &tier, ConfigTier::Defaults)?;
        }

        if !self.files.is_empty() {
            let tier = Config::new().with_shared_loader(Arc::clone(&self.loader));
            let report = tier.load_files(&self.files, true);
            self.check_report(ConfigTier::File, report)?;
            self.merge_tier(&config, &tier, ConfigTier::File)?;
        }

        if !self.env_prefixes.is_empty() {
            let tier = Config::new().with_shared_loader(Arc::clone(&self.loader));
            let report = tier.load_env(&self.env_prefixes, true);
            self.check_report(ConfigTier::Environment, report)?;
            self.merge_tier(&config, &tier, ConfigTier::Environment)?;
        }

        config.require_keys(&self.required)?;
        debug!(keys = config.len(), "config built");
        Ok(config)
    }

    fn merge_tier(&self, config: &Config, tier: &Config, kind: ConfigTier) -> Result<()> {
        debug!(tier = %kind, keys = tier.len(), "applying config tier");
        config.merge(tier, true)
    }

    fn check_report(&self, kind: ConfigTier, report: LoadReport) -> Result<()> {
        if report.is_clean() {
            return Ok(());
        }
        if self.strict {
            return report.into_result().map(|_| ());
        }
        for err in &report.errors {
            warn!(tier = %kind, error = %err, "ignoring config entry");
        }
        Ok(())
    }
}

/// Shorthand for the common case: environment prefixes over optional files.
pub fn load_config<S: AsRef<str>>(prefixes: &[S], files: &[PathBuf], strict: bool) -> Result<Config> {
    let mut builder = ConfigBuilder::new().strict(strict);
    for path in files {
        builder = builder.file(path.clone());
    }
    for prefix in prefixes {
        builder = builder.env_prefix(prefix.as_ref());
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, ErrorKind};
    use crate::values;

    #[test]
    fn test_config_and_builder_are_send_sync() {
        fn check<T: Send + Sync>() {}
        check::<Config>();
        check::<ConfigBuilder>();
    }

    #[test]
    fn test_later_defaults_override_earlier() {
        let config = ConfigBuilder::new()
            .defaults(values! { "a" => "1", "b" => "1" })
            .defaults(values! { "b" => "2" })
            .build()
            .unwrap();
        assert_eq!(config.get_string("a").unwrap(), "1");
        assert_eq!(config.get_string("b").unwrap(), "2");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = ConfigBuilder::new()
            .defaults(values! { "log" => values! { "level" => "info" } })
            .env_prefix("APP")
            .loader(DefaultLoader::with_env([("APP_LOG_LEVEL", "debug")]))
            .build()
            .unwrap();
        assert_eq!(config.get_string("log.level").unwrap(), "debug");
    }

    #[test]
    fn test_missing_required_key_fails_build() {
        let err = ConfigBuilder::new()
            .defaults(values! { "a" => "1" })
            .require("a")
            .require("b.c")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::KeyNotFound(ref k) if k == "B.C"));
    }

    #[test]
    fn test_strict_build_rejects_bad_entries() {
        let loader = DefaultLoader::with_env([("APP_BAD KEY", "x"), ("APP_GOOD", "y")]);

        let lenient = ConfigBuilder::new()
            .env_prefix("APP")
            .loader(loader.clone())
            .build()
            .unwrap();
        assert_eq!(lenient.get_string("good").unwrap(), "y");

        let err = ConfigBuilder::new()
            .env_prefix("APP")
            .loader(loader)
            .strict(true)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadError);
    }

    #[test]
    fn test_load_config_reads_files() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db.host=localhost").unwrap();
        writeln!(file, "db.port: 5432").unwrap();
        let files = vec![file.path().to_path_buf()];

        let config = load_config(&["CONFIG_TREE_UNSET_PREFIX"], &files, true).unwrap();
        assert_eq!(config.get_string("db.host").unwrap(), "localhost");
        assert_eq!(config.get_int("db.port").unwrap(), 5432);

        let missing = vec![PathBuf::from("/nonexistent/app.env")];
        let err = load_config::<&str>(&[], &missing, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadError);
        assert!(load_config::<&str>(&[], &missing, false).unwrap().is_empty());
    }

    #[test]
    fn test_tier_order() {
        assert!(ConfigTier::Defaults < ConfigTier::File);
        assert!(ConfigTier::File < ConfigTier::Environment);
        assert_eq!(ConfigTier::Environment.to_string(), "environment");
    }
}
