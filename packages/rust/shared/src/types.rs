//! Core domain types shared by the stocklab crates.

use serde::{Deserialize, Serialize};

/// Computed value returned by unit evaluation.
pub type Value = serde_json::Value;

// ---------------------------------------------------------------------------
// UnitKind
// ---------------------------------------------------------------------------

/// Capability family of a registered unit.
///
/// Ordered by specificity: a meta-module is also a module, so it always
/// wins when a unit is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    MetaModule,
    Module,
    Crawler,
}

impl UnitKind {
    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MetaModule => "meta-module",
            Self::Module => "module",
            Self::Crawler => "crawler",
        }
    }

    /// Whether units of this kind can be addressed by a path expression.
    pub fn is_evaluable(self) -> bool {
        !matches!(self, Self::Crawler)
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_kind_labels() {
        assert_eq!(UnitKind::MetaModule.to_string(), "meta-module");
        assert_eq!(UnitKind::Crawler.as_str(), "crawler");
        assert!(UnitKind::Module.is_evaluable());
        assert!(!UnitKind::Crawler.is_evaluable());
    }

    #[test]
    fn unit_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&UnitKind::MetaModule).expect("serialize");
        assert_eq!(json, "\"meta-module\"");
        let parsed: UnitKind = serde_json::from_str("\"crawler\"").expect("deserialize");
        assert_eq!(parsed, UnitKind::Crawler);
    }
}
