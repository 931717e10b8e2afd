//! Hierarchical, concurrency-safe configuration store.
//!
//! This module exports the store, its loaders and the dump formats.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;

pub use config::{
    Config, ConfigBuilder, ConfigTier, ConfigValue, DefaultLoader, Loader, ValueMap, load_config,
};
pub use error::{ConfigError, ErrorKind, Result};
pub use format::DumpFormat;
