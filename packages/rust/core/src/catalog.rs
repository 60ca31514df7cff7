//! Plugin catalog and on-disk artifacts.
//!
//! Implementations are compiled in and registered by name in a
//! [`PluginCatalog`]. A unit becomes discoverable when its artifact,
//! `<Name>.toml`, sits in the modules or crawlers directory; the artifact
//! carries the unit's description and parameters.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use stocklab_shared::{Result, StocklabError};

use crate::path::is_unit_name;
use crate::unit::{Plugin, UnitSpec};

/// File extension of unit artifacts.
pub const ARTIFACT_EXTENSION: &str = "toml";

/// Builds one plugin instance from its spec.
pub type PluginFactory = Box<dyn Fn(UnitSpec) -> Result<Box<dyn Plugin>>>;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Startup-time table of available unit implementations.
#[derive(Default)]
pub struct PluginCatalog {
    factories: HashMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any earlier registration.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(UnitSpec) -> Result<Box<dyn Plugin>> + 'static,
    {
        if self
            .factories
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            warn!(name, "plugin registered twice, keeping the latest factory");
        }
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(UnitSpec) -> Result<Box<dyn Plugin>> + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the plugin registered under `spec.name`.
    pub fn instantiate(&self, spec: UnitSpec) -> Result<Box<dyn Plugin>> {
        let factory = self
            .factories
            .get(&spec.name)
            .ok_or_else(|| StocklabError::NotRegistered {
                name: spec.name.clone(),
            })?;
        factory(spec)
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("plugins", &self.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Contents of a `<Name>.toml` artifact. An empty file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactDescriptor {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub params: toml::Table,
}

/// Location of the artifact for `name` inside `dir`.
pub fn artifact_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
}

/// Read and parse the artifact for `name`.
pub fn read_artifact(dir: &Path, name: &str) -> Result<ArtifactDescriptor> {
    let path = artifact_path(dir, name);
    if !is_unit_name(name) || !path.is_file() {
        return Err(StocklabError::ArtifactNotFound {
            name: name.to_string(),
            path,
        });
    }

    let content = std::fs::read_to_string(&path).map_err(|e| StocklabError::io(&path, e))?;
    toml::from_str(&content).map_err(|e| {
        StocklabError::config(format!("failed to parse artifact {}: {e}", path.display()))
    })
}

/// Names of every artifact in `dir`, sorted by file name.
pub fn discover(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| StocklabError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StocklabError::io(dir, e))?.path();
        if !path.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION)
        {
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if is_unit_name(stem) => names.push(stem.to_string()),
            _ => debug!(?path, "skipping file without a valid unit name"),
        }
    }

    names.sort_unstable();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LoggerFacility;
    use crate::unit::Unit;

    struct Shapeless;

    impl Plugin for Shapeless {
        fn into_unit(self: Box<Self>) -> Option<Unit> {
            None
        }
    }

    fn spec(name: &str) -> UnitSpec {
        UnitSpec {
            name: name.to_string(),
            description: None,
            params: toml::Table::new(),
            data_dir: PathBuf::from("/tmp"),
            logger: LoggerFacility::default().logger(name),
        }
    }

    #[test]
    fn catalog_instantiates_registered_names() {
        let catalog = PluginCatalog::new()
            .with("Shapeless", |_| Ok(Box::new(Shapeless) as Box<dyn Plugin>));
        assert!(catalog.contains("Shapeless"));
        assert_eq!(catalog.names(), vec!["Shapeless"]);

        let plugin = catalog.instantiate(spec("Shapeless")).expect("instantiate");
        assert!(plugin.into_unit().is_none());
    }

    #[test]
    fn catalog_rejects_unknown_names() {
        let catalog = PluginCatalog::new();
        let err = catalog.instantiate(spec("Missing")).err().expect("expected error");
        assert!(matches!(err, StocklabError::NotRegistered { .. }));
    }

    #[test]
    fn artifact_path_appends_extension() {
        let path = artifact_path(Path::new("/app/modules"), "Foo");
        assert_eq!(path, PathBuf::from("/app/modules/Foo.toml"));
    }

    #[test]
    fn descriptor_defaults_when_empty() {
        let descriptor: ArtifactDescriptor = toml::from_str("").expect("parse");
        assert!(descriptor.description.is_none());
        assert!(descriptor.params.is_empty());

        let descriptor: ArtifactDescriptor = toml::from_str(
            r#"
description = "daily close prices"

[params]
window = 20
"#,
        )
        .expect("parse");
        assert_eq!(descriptor.description.as_deref(), Some("daily close prices"));
        assert_eq!(
            descriptor.params.get("window").and_then(|v| v.as_integer()),
            Some(20)
        );
    }

    #[test]
    fn missing_artifact_is_reported() {
        let err = read_artifact(Path::new("/nonexistent"), "Foo").unwrap_err();
        assert!(matches!(err, StocklabError::ArtifactNotFound { .. }));

        let err = read_artifact(Path::new("/nonexistent"), "../Foo").unwrap_err();
        assert!(matches!(err, StocklabError::ArtifactNotFound { .. }));
    }
}
