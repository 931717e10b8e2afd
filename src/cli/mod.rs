//! CLI command definitions for config-tree
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::format::DumpFormat;

/// Output format accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// Flat KEY=VALUE lines
    Env,
    /// Nested, indented text (default)
    #[default]
    Txt,
    /// Nested JSON
    Json,
}

impl From<FormatArg> for DumpFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Env => DumpFormat::Env,
            FormatArg::Txt => DumpFormat::Txt,
            FormatArg::Json => DumpFormat::Json,
        }
    }
}

/// Assemble configuration from defaults, files and the environment
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Environment prefix to load (PREFIX_SEGMENT_SEGMENT=value), repeatable
    #[arg(short, long = "prefix", global = true)]
    pub prefixes: Vec<String>,

    /// KEY=VALUE file to load, repeatable; later files win
    #[arg(short, long = "file", global = true)]
    pub files: Vec<PathBuf>,

    /// YAML document with default values (lowest priority)
    #[arg(short, long, global = true)]
    pub defaults: Option<PathBuf>,

    /// Key that must be present, repeatable
    #[arg(short, long = "require", global = true)]
    pub required: Vec<String>,

    /// Fail on malformed or unreadable entries instead of skipping them
    #[arg(long, global = true)]
    pub strict: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the nested view (default if no subcommand given)
    Show,

    /// Print one value, or the nested sub-tree below a key
    Get {
        /// Key path, e.g. db.host
        key: String,
    },

    /// List stored keys, optionally below a prefix
    Keys {
        /// Only keys at or below this path
        prefix: Option<String>,
    },

    /// Render the configuration to stdout or a file
    Dump {
        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Txt)]
        format: FormatArg,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Exit with an error unless every key is present
    Check {
        /// Key paths to check
        #[arg(required = true)]
        keys: Vec<String>,
    },
}
