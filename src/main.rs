//! config-tree
//!
//! Assembles a configuration from a YAML defaults document, KEY=VALUE files
//! and prefixed environment variables, then prints, queries or dumps it.

use anyhow::{Context, Result};
use clap::Parser;
use config_tree::cli::{Cli, Command};
use config_tree::config::{ConfigBuilder, ConfigValue, ValueMap, key};
use config_tree::format::DumpFormat;
use config_tree::logging::{self, LogTarget};
use config_tree::Config;
use std::path::Path;
use tracing::debug;

fn load_defaults(path: &Path) -> Result<ValueMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading defaults from {}", path.display()))?;
    let defaults: ValueMap = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing defaults in {}", path.display()))?;
    Ok(defaults)
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut builder = ConfigBuilder::new().strict(cli.strict);
    if let Some(path) = &cli.defaults {
        builder = builder.defaults(load_defaults(path)?);
    }
    for path in &cli.files {
        builder = builder.file(path.clone());
    }
    for prefix in &cli.prefixes {
        builder = builder.env_prefix(prefix.clone());
    }
    for key in &cli.required {
        builder = builder.require(key.clone());
    }
    let config = builder.build()?;
    debug!(keys = config.len(), "configuration assembled");
    Ok(config)
}

fn run_get(config: &Config, key: &str) -> Result<()> {
    match config.get(key)? {
        ConfigValue::Map(_) => print!("{}", config.get_config(key)?.sprint()),
        value => println!("{}", value),
    }
    Ok(())
}

fn run_keys(config: &Config, prefix: Option<&str>) -> Result<()> {
    let root = prefix.map(key::normalize).transpose()?;
    for stored in config.keys() {
        let listed = match &root {
            Some(root) => key::suffix_under(&stored, root).is_some(),
            None => true,
        };
        if listed {
            println!("{}", stored);
        }
    }
    Ok(())
}

fn run_dump(config: &Config, format: DumpFormat, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => config.dump_to_file(format.as_str(), path)?,
        None => print!("{}", config.render(format)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = build_config(&cli)?;

    match &cli.command {
        Some(Command::Get { key }) => run_get(&config, key)?,
        Some(Command::Keys { prefix }) => run_keys(&config, prefix.as_deref())?,
        Some(Command::Dump { format, output }) => {
            run_dump(&config, (*format).into(), output.as_deref())?
        }
        Some(Command::Check { keys }) => {
            config.require_keys(keys)?;
            println!("ok");
        }
        Some(Command::Show) | None => print!("{}", config.sprint()),
    }

    Ok(())
}
