//! Hierarchical configuration store.
//!
//! Settings live in a flat map from full key paths to strings; the tree is
//! implicit in the key prefixes and rebuilt on demand:
//! 1. **Keys** - `db.host`, `DB/HOST` and `Db.Host` all address `DB.HOST`
//! 2. **Store** - one `RwLock` per config, locked per single-key operation
//! 3. **Tree** - `flatten`/`nest` between the flat and the nested view
//! 4. **Config** - typed reads, merge, compare, copy, sub-tree extraction
//!
//! ## Sources
//! - Nested initial values (`ValueMap`, JSON or YAML documents)
//! - Environment variables: `APP_DB_HOST` with prefix `APP` sets `DB.HOST`
//! - `KEY=VALUE` / `KEY: VALUE` files
//! - `*_FILE` keys read their value from the file they name
//!
//! ## Precedence
//! [`ConfigBuilder`] applies defaults, then files, then the environment,
//! each tier overwriting the one below.

mod builder;
mod facade;
pub mod key;
mod loader;
mod store;
pub mod tree;
mod typed;
mod value;

pub use builder::{ConfigBuilder, ConfigTier, load_config};
pub use facade::{Config, LoadReport};
pub use loader::{
    DefaultLoader, Entry, LoadOutcome, Loader, parse_env_var, parse_file_line,
};
pub use store::{FlatStore, Lookup};
pub use tree::FlatMap;
pub use value::{ConfigValue, ValueMap};
