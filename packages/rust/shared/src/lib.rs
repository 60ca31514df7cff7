//! Shared types, error model, and configuration for stocklab.
//!
//! This crate is the foundation depended on by the runtime crate.
//! It provides:
//! - [`StocklabError`] — the unified error type
//! - Domain types ([`UnitKind`], [`Value`])
//! - Configuration ([`StocklabConfig`], [`PluginDirs`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, CRAWLER_DIR, DATA_DIR, MODULE_DIR, PluginDirs, StocklabConfig, load_config,
    load_config_from,
};
pub use error::{Result, StocklabError};
pub use types::{UnitKind, Value};
