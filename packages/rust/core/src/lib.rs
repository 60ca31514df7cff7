//! Plugin registry and path evaluation runtime for stocklab.
//!
//! Crawlers acquire raw data, modules compute values on demand, and
//! meta-modules aggregate other units and refresh themselves at startup.
//! This crate ties them together:
//! - [`catalog`] — compiled-in plugin factories and on-disk artifacts
//! - [`registry`] — name-keyed singleton scopes
//! - [`path`] — the dotted path expression language
//! - [`Context`] — bootstrap, lookup, evaluation and diagnostics

mod bootstrap;
pub mod catalog;
pub mod context;
mod eval;
pub mod logging;
pub mod path;
pub mod registry;
pub mod state;
pub mod unit;

pub use catalog::{ArtifactDescriptor, PluginCatalog, PluginFactory};
pub use context::{CORE_LOGGER, Context};
pub use logging::{LogFormat, Logger, LoggerFacility, init_tracing};
pub use path::UnitPath;
pub use state::StateStore;
pub use unit::{
    Crawler, CrawlerRef, MetaModule, Module, ModuleRef, Plugin, Primitive, Unit, UnitSpec,
};

pub use stocklab_shared::{
    PluginDirs, Result, StocklabConfig, StocklabError, UnitKind, Value,
};
