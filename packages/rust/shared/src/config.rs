//! Runtime configuration for stocklab.
//!
//! The config lives in `config.toml` in the working directory. It must carry
//! a `root_dir`; every other table is kept verbatim for units to read.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::{Result, StocklabError};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Subdirectory of `root_dir` holding module and meta-module artifacts.
pub const MODULE_DIR: &str = "modules";

/// Subdirectory of `root_dir` holding crawler artifacts.
pub const CRAWLER_DIR: &str = "crawlers";

/// Subdirectory of `root_dir` reserved for unit data.
pub const DATA_DIR: &str = "app_data";

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Top-level runtime config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocklabConfig {
    /// Root of the plugin directory layout.
    pub root_dir: PathBuf,

    /// Default severity for every logger (`off`, `error`, ..., `trace`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Remaining keys, available to units through the context.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl StocklabConfig {
    /// Build a config rooted at `root_dir` with no extra keys.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            log_level: None,
            extra: toml::Table::new(),
        }
    }

    /// Resolve `root_dir` to an absolute path and derive the unit directories.
    pub fn resolve_dirs(&self) -> Result<PluginDirs> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(StocklabError::config("root_dir must not be empty"));
        }
        let root =
            std::path::absolute(&self.root_dir).map_err(|e| StocklabError::io(&self.root_dir, e))?;

        Ok(PluginDirs {
            modules: root.join(MODULE_DIR),
            crawlers: root.join(CRAWLER_DIR),
            data: root.join(DATA_DIR),
            root,
        })
    }

    /// Parse the configured default log level, if any.
    pub fn default_level(&self) -> Result<Option<LevelFilter>> {
        self.log_level
            .as_deref()
            .map(|raw| {
                raw.parse::<LevelFilter>()
                    .map_err(|e| StocklabError::config(format!("invalid log_level {raw:?}: {e}")))
            })
            .transpose()
    }
}

/// Absolute directory locations derived from `root_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDirs {
    pub root: PathBuf,
    pub modules: PathBuf,
    pub crawlers: PathBuf,
    pub data: PathBuf,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load `config.toml` from the working directory.
pub fn load_config() -> Result<StocklabConfig> {
    load_config_from(Path::new(CONFIG_FILE_NAME))
}

/// Load the runtime config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<StocklabConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        StocklabError::config(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: StocklabConfig = toml::from_str(&content).map_err(|e| {
        StocklabError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    tracing::debug!(?path, root_dir = ?config.root_dir, "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_requires_root_dir() {
        let result: std::result::Result<StocklabConfig, _> = toml::from_str("log_level = \"debug\"");
        assert!(result.is_err());
    }

    #[test]
    fn config_keeps_extra_tables() {
        let toml_str = r#"
root_dir = "/app"
log_level = "warn"

[db]
url = "sqlite://stock.db"
"#;
        let config: StocklabConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.root_dir, PathBuf::from("/app"));
        assert_eq!(config.default_level().expect("level"), Some(LevelFilter::WARN));
        let db = config.extra.get("db").and_then(|v| v.as_table()).expect("db table");
        assert_eq!(db.get("url").and_then(|v| v.as_str()), Some("sqlite://stock.db"));
    }

    #[test]
    fn resolve_dirs_uses_fixed_subpaths() {
        let config = StocklabConfig::new("/app");
        let dirs = config.resolve_dirs().expect("resolve");
        assert_eq!(dirs.root, PathBuf::from("/app"));
        assert_eq!(dirs.modules, PathBuf::from("/app/modules"));
        assert_eq!(dirs.crawlers, PathBuf::from("/app/crawlers"));
        assert_eq!(dirs.data, PathBuf::from("/app/app_data"));
    }

    #[test]
    fn relative_root_becomes_absolute() {
        let dirs = StocklabConfig::new("data-root").resolve_dirs().expect("resolve");
        assert!(dirs.root.is_absolute());
        assert!(dirs.root.ends_with("data-root"));
    }

    #[test]
    fn empty_root_dir_is_rejected() {
        let err = StocklabConfig::new("").resolve_dirs().unwrap_err();
        assert!(matches!(err, StocklabError::Config { .. }));
    }

    #[test]
    fn invalid_log_level_is_config_error() {
        let mut config = StocklabConfig::new("/app");
        config.log_level = Some("loud".into());
        let err = config.default_level().unwrap_err();
        assert!(err.to_string().contains("invalid log_level"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config_from(Path::new("/nonexistent/stocklab/config.toml")).unwrap_err();
        assert!(matches!(err, StocklabError::Config { .. }));
        assert!(err.to_string().contains("failed to read"));
    }
}
