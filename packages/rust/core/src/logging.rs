//! Named loggers with a settable severity, plus subscriber setup.
//!
//! Every unit owns a [`Logger`] keyed by its name. A logger does not hold a
//! subscriber of its own: it gates events by its own [`LevelFilter`] and then
//! emits them through `tracing` with a `unit` field, so the process-wide
//! subscriber still decides where they end up.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use tracing::Level;
use tracing::level_filters::LevelFilter;

/// Level every logger starts at unless the config says otherwise.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

/// `tracing` target of every event a [`Logger`] emits.
pub const UNIT_TARGET: &str = "stocklab";

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Name-keyed logger handle. Clones share the same level.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Rc<str>,
    level: Rc<Cell<LevelFilter>>,
}

impl Logger {
    fn new(name: &str, level: LevelFilter) -> Self {
        Self {
            name: Rc::from(name),
            level: Rc::new(Cell::new(level)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        self.level.get()
    }

    pub fn set_level(&self, level: LevelFilter) {
        self.level.set(level);
    }

    /// Whether an event at `level` passes this logger's filter.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level.get()
    }

    pub fn error(&self, message: impl Display) {
        if self.enabled(Level::ERROR) {
            tracing::error!(target: UNIT_TARGET, unit = %self.name, "{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.enabled(Level::WARN) {
            tracing::warn!(target: UNIT_TARGET, unit = %self.name, "{message}");
        }
    }

    pub fn info(&self, message: impl Display) {
        if self.enabled(Level::INFO) {
            tracing::info!(target: UNIT_TARGET, unit = %self.name, "{message}");
        }
    }

    pub fn debug(&self, message: impl Display) {
        if self.enabled(Level::DEBUG) {
            tracing::debug!(target: UNIT_TARGET, unit = %self.name, "{message}");
        }
    }

    pub fn trace(&self, message: impl Display) {
        if self.enabled(Level::TRACE) {
            tracing::trace!(target: UNIT_TARGET, unit = %self.name, "{message}");
        }
    }
}

// ---------------------------------------------------------------------------
// Facility
// ---------------------------------------------------------------------------

/// Creates and caches loggers by name.
#[derive(Debug)]
pub struct LoggerFacility {
    default_level: LevelFilter,
    loggers: HashMap<String, Logger>,
}

impl LoggerFacility {
    pub fn new(default_level: LevelFilter) -> Self {
        Self {
            default_level,
            loggers: HashMap::new(),
        }
    }

    /// Return the logger called `name`, creating it at the default level.
    pub fn logger(&mut self, name: &str) -> Logger {
        let default_level = self.default_level;
        self.loggers
            .entry(name.to_string())
            .or_insert_with(|| Logger::new(name, default_level))
            .clone()
    }

    pub fn default_level(&self) -> LevelFilter {
        self.default_level
    }

    /// Level given to loggers created from now on. Existing loggers keep theirs.
    pub fn set_default_level(&mut self, level: LevelFilter) {
        self.default_level = level;
    }
}

impl Default for LoggerFacility {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Default filter for [`init_tracing`].
///
/// Unit events pass at every level: their [`Logger`] has already gated them,
/// so [`Context::change_log_level`](crate::Context::change_log_level) decides
/// what reaches the output. `verbose` only picks the level for the runtime's
/// internal spans and events.
pub fn default_filter(verbose: u8) -> tracing_subscriber::EnvFilter {
    let internal = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::EnvFilter::new(format!(
        "{UNIT_TARGET}=trace,stocklab_core={internal},stocklab_shared={internal}"
    ))
}

/// Install a global `tracing` subscriber for a binary embedding the runtime.
///
/// `RUST_LOG` wins when set; otherwise see [`default_filter`].
/// Panics if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat, verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    match format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
