//! Error types for stocklab.
//!
//! Every registry, loader and evaluator failure is a [`StocklabError`]
//! variant. Nothing inside the runtime catches or translates these; they
//! propagate straight to the caller.

use std::path::PathBuf;

use crate::types::UnitKind;

/// Top-level error type for all stocklab operations.
#[derive(Debug, thiserror::Error)]
pub enum StocklabError {
    /// Configuration file missing, unreadable, or lacking `root_dir`.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A unit name is already registered.
    #[error("duplicate declaration: {name} is already registered as a {kind}")]
    DuplicateDeclaration { name: String, kind: UnitKind },

    /// A plugin exposes none of the capabilities an operation needs.
    #[error("unit {name} does not expose the {capability} capability")]
    UnknownCapability {
        name: String,
        capability: &'static str,
    },

    /// No artifact for the unit exists in the expected directory.
    #[error("stocklab unit {name} not found (looked for {path:?})")]
    ArtifactNotFound { name: String, path: PathBuf },

    /// An artifact exists but no factory was registered under its name.
    #[error("no plugin registered for unit {name}")]
    NotRegistered { name: String },

    /// Malformed path expression.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The unit's classification disagrees with the requested addressing mode.
    #[error("addressing mismatch for {name}: expected a {expected}, found a {found}")]
    AddressingMismatch {
        name: String,
        expected: UnitKind,
        found: UnitKind,
    },

    /// A unit was called while it was already executing.
    #[error("unit {name} is already executing")]
    Reentrant { name: String },

    /// Failure raised by a unit's own logic.
    #[error("unit {name} failed: {message}")]
    Unit { name: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StocklabError>;

impl StocklabError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid-path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an error attributed to a unit's own logic.
    pub fn unit(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Unit {
            name: name.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = StocklabError::config("missing root_dir");
        assert_eq!(err.to_string(), "config error: missing root_dir");

        let err = StocklabError::AddressingMismatch {
            name: "Bar".into(),
            expected: UnitKind::Module,
            found: UnitKind::MetaModule,
        };
        assert_eq!(
            err.to_string(),
            "addressing mismatch for Bar: expected a module, found a meta-module"
        );
    }

    #[test]
    fn invalid_path_keeps_raw_path() {
        let err = StocklabError::invalid_path("a{b}", "reserved character '{'");
        assert!(err.to_string().contains("\"a{b}\""));
        assert!(err.to_string().contains("reserved character"));
    }
}
