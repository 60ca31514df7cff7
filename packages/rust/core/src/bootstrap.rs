//! One-time construction of a [`Context`].
//!
//! 1. Load the config and resolve `root_dir`
//! 2. Derive the modules/crawlers/data directories
//! 3. Create the core logger
//! 4. Load every artifact in the modules directory
//! 5. Refresh every meta-module once, in discovery order
//!
//! Any failure aborts the whole sequence and no context is returned, so the
//! caller may fix the cause and bootstrap again.

use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument};

use stocklab_shared::{Result, StocklabConfig, load_config, load_config_from};

use crate::catalog::{self, PluginCatalog};
use crate::context::Context;
use crate::logging::DEFAULT_LEVEL;

impl Context {
    /// Bootstrap from `config.toml` in the working directory.
    pub fn load(catalog: PluginCatalog) -> Result<Self> {
        Self::bootstrap(load_config()?, catalog)
    }

    /// Bootstrap from the config file at `path`.
    pub fn load_from(path: &Path, catalog: PluginCatalog) -> Result<Self> {
        Self::bootstrap(load_config_from(path)?, catalog)
    }

    /// Bootstrap from an already loaded config.
    #[instrument(skip_all, fields(root_dir = %config.root_dir.display()))]
    pub fn bootstrap(config: StocklabConfig, catalog: PluginCatalog) -> Result<Self> {
        let start = Instant::now();

        let dirs = config.resolve_dirs()?;
        let default_level = config.default_level()?.unwrap_or(DEFAULT_LEVEL);
        let mut ctx = Context::new(config, dirs, catalog, default_level);

        let modules_dir = ctx.dirs().modules.clone();
        for name in catalog::discover(&modules_dir)? {
            ctx.load_and_instantiate(&modules_dir, &name)?;
        }

        let meta_modules = ctx.registry.meta_module_names();
        for name in &meta_modules {
            if let Some(unit) = ctx.registry.module(name) {
                ctx.logger().debug(format!("refreshing meta-module {name}"));
                unit.refresh(&mut ctx)?;
            }
        }

        info!(
            units = ctx.registry.len(),
            meta_modules = meta_modules.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "bootstrap complete"
        );

        Ok(ctx)
    }
}
