//! The runtime context: configuration, registry scopes, loggers and state.
//!
//! A [`Context`] only exists after a successful bootstrap (see
//! [`Context::bootstrap`]). Callers pass it by `&mut` to every registry and
//! evaluation operation; units receive it too, so they can evaluate other
//! units from inside their own computations.

use std::path::Path;

use tracing::{debug, instrument};
use tracing::level_filters::LevelFilter;

use stocklab_shared::{PluginDirs, Result, StocklabConfig, StocklabError, UnitKind, Value};

use crate::catalog::{self, ArtifactDescriptor, PluginCatalog};
use crate::logging::{Logger, LoggerFacility};
use crate::path::is_unit_name;
use crate::registry::Registry;
use crate::state::StateStore;
use crate::unit::{CrawlerRef, ModuleRef, Plugin, Unit, UnitSpec};

/// Name of the runtime's own diagnostic logger.
pub const CORE_LOGGER: &str = "stocklab_core";

pub struct Context {
    config: StocklabConfig,
    dirs: PluginDirs,
    catalog: PluginCatalog,
    loggers: LoggerFacility,
    logger: Logger,
    pub(crate) registry: Registry,
    state: StateStore,
}

impl Context {
    pub(crate) fn new(
        config: StocklabConfig,
        dirs: PluginDirs,
        catalog: PluginCatalog,
        default_level: LevelFilter,
    ) -> Self {
        let mut loggers = LoggerFacility::new(default_level);
        let logger = loggers.logger(CORE_LOGGER);
        Self {
            config,
            dirs,
            catalog,
            loggers,
            logger,
            registry: Registry::new(),
            state: StateStore::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &StocklabConfig {
        &self.config
    }

    pub fn dirs(&self) -> &PluginDirs {
        &self.dirs
    }

    pub fn data_dir(&self) -> &Path {
        &self.dirs.data
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// The core diagnostic logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Every cached unit as `(name, kind)`.
    pub fn units(&self) -> Vec<(String, UnitKind)> {
        self.registry.units()
    }

    /// Registered kind of `name`, if it is cached.
    pub fn kind_of(&self, name: &str) -> Option<UnitKind> {
        self.registry.kind_of(name)
    }

    // -----------------------------------------------------------------------
    // Registration and loading
    // -----------------------------------------------------------------------

    /// Instantiate a unit through `factory` and register it under `name`.
    ///
    /// Meta-modules land in the meta-module scope, plain modules in the module
    /// scope, crawlers in the crawler scope. The registry is left untouched
    /// on failure.
    pub fn declare<F>(&mut self, name: &str, factory: F) -> Result<UnitKind>
    where
        F: FnOnce(UnitSpec) -> Result<Box<dyn Plugin>>,
    {
        if !is_unit_name(name) {
            return Err(StocklabError::invalid_path(name, "not a valid unit name"));
        }
        if let Some(kind) = self.registry.kind_of(name) {
            return Err(StocklabError::DuplicateDeclaration {
                name: name.to_string(),
                kind,
            });
        }

        let spec = self.unit_spec(name, ArtifactDescriptor::default());
        let logger = spec.logger.clone();
        let unit = classify(name, factory(spec)?)?;
        let kind = self.registry.insert(name, unit, logger)?;
        debug!(name, %kind, "unit declared");
        Ok(kind)
    }

    /// Load the artifact for `name` from `dir`, instantiate it through the
    /// catalog and cache it in the scope of its most specific kind.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub fn load_and_instantiate(&mut self, dir: &Path, name: &str) -> Result<UnitKind> {
        let (unit, logger) = self.instantiate_artifact(dir, name)?;
        let kind = self.registry.insert(name, unit, logger)?;
        debug!(%kind, "unit loaded");
        Ok(kind)
    }

    fn instantiate_artifact(&mut self, dir: &Path, name: &str) -> Result<(Unit, Logger)> {
        let descriptor = catalog::read_artifact(dir, name)?;
        let spec = self.unit_spec(name, descriptor);
        let logger = spec.logger.clone();
        let unit = classify(name, self.catalog.instantiate(spec)?)?;
        Ok((unit, logger))
    }

    /// Cached module for `name`, loading it from the modules directory on
    /// first use. A meta-module is always preferred over a plain module.
    ///
    /// An artifact that turns out to be a crawler is rejected without being
    /// cached.
    pub fn get_module(&mut self, name: &str) -> Result<ModuleRef> {
        if let Some(module) = self.registry.module(name) {
            return Ok(module);
        }
        if let Some(found) = self.registry.kind_of(name) {
            return Err(mismatch(name, UnitKind::Module, found));
        }

        let dir = self.dirs.modules.clone();
        let (unit, logger) = self.instantiate_artifact(&dir, name)?;
        if !unit.kind().is_evaluable() {
            return Err(mismatch(name, UnitKind::Module, unit.kind()));
        }
        let kind = self.registry.insert(name, unit, logger)?;
        debug!(name, %kind, "unit loaded on demand");
        self.registry
            .module(name)
            .ok_or_else(|| mismatch(name, UnitKind::Module, kind))
    }

    /// Cached crawler for `name`, loading it from the crawlers directory on
    /// first use. An artifact there that is not a crawler is not cached.
    pub fn get_crawler(&mut self, name: &str) -> Result<CrawlerRef> {
        if let Some(crawler) = self.registry.crawler(name) {
            return Ok(crawler);
        }
        if let Some(found) = self.registry.kind_of(name) {
            return Err(mismatch(name, UnitKind::Crawler, found));
        }

        let dir = self.dirs.crawlers.clone();
        let (unit, logger) = self.instantiate_artifact(&dir, name)?;
        if unit.kind() != UnitKind::Crawler {
            return Err(mismatch(name, UnitKind::Crawler, unit.kind()));
        }
        let kind = self.registry.insert(name, unit, logger)?;
        debug!(name, %kind, "crawler loaded on demand");
        self.registry
            .crawler(name)
            .ok_or_else(|| mismatch(name, UnitKind::Crawler, kind))
    }

    /// Resolve the crawler `name` and run it on `request`.
    pub fn crawl(&mut self, name: &str, request: &Value) -> Result<Value> {
        let crawler = self.get_crawler(name)?;
        self.logger.debug(format!("crawling with {name}"));
        crawler.crawl(self, request)
    }

    fn unit_spec(&mut self, name: &str, descriptor: ArtifactDescriptor) -> UnitSpec {
        UnitSpec {
            name: name.to_string(),
            description: descriptor.description,
            params: descriptor.params,
            data_dir: self.dirs.data.clone(),
            logger: self.loggers.logger(name),
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Set the default severity and apply it to every cached unit's logger
    /// and to the core logger.
    pub fn change_log_level(&mut self, level: LevelFilter) {
        self.loggers.set_default_level(level);
        for logger in self.registry.loggers() {
            logger.set_level(level);
        }
        self.logger.set_level(level);
    }

    /// Switch every logger to debug output.
    pub fn debug_mode(&mut self) {
        self.logger.info("switching to debug mode");
        self.change_log_level(LevelFilter::DEBUG);
    }

    // -----------------------------------------------------------------------
    // Shared state
    // -----------------------------------------------------------------------

    /// Store a value in the context-wide state, returning the previous one.
    pub fn set_state(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.state.set(key, value)
    }

    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn state_mut(&mut self) -> &mut StateStore {
        &mut self.state
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("dirs", &self.dirs)
            .field("units", &self.registry.units())
            .finish_non_exhaustive()
    }
}

fn classify(name: &str, plugin: Box<dyn Plugin>) -> Result<Unit> {
    plugin
        .into_unit()
        .ok_or_else(|| StocklabError::UnknownCapability {
            name: name.to_string(),
            capability: "module or crawler",
        })
}

pub(crate) fn mismatch(name: &str, expected: UnitKind, found: UnitKind) -> StocklabError {
    StocklabError::AddressingMismatch {
        name: name.to_string(),
        expected,
        found,
    }
}
