//! Logging utilities with colored scope prefixes.
//!
//! This module provides:
//! - [`Logger`], a cheap-clone handle carrying an explicit [`LogLevel`]
//! - `log!`, `info!`, `warn!`, `error!`, `debug!` macros taking the logger first
//! - [`Logger::time`] for timing an async initialization step
//!
//! The level is never global: it is read from configuration at startup and the
//! logger is handed to every component that writes output.
//!
//! # Example
//!
//! ```ignore
//! let logger = Logger::new(LogLevel::Log);
//! log!(logger, "locale"; "loaded {} language packs", count);
//! debug!(logger, "parrot"; "scenario files: {:?}", paths);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    io::{Write, stderr, stdout},
    sync::Arc,
    time::Instant,
};

// ============================================================================
// Levels
// ============================================================================

/// Verbosity threshold.
///
/// `error` lines are always printed; `warn`, `log` and `debug` are cumulative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Log,
    Debug,
}

/// Kind of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Error,
    Warn,
    Info,
    Log,
    Debug,
    Time,
}

/// A formatted log line handed to a [`LogSink`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub kind: LogKind,
    pub scope: &'a str,
    pub message: &'a str,
}

/// Destination for log records.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record<'_>);
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored scope prefix
///
/// # Usage
/// ```ignore
/// log!(logger, "scope"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $scope:expr; $($arg:tt)*) => {{
        $logger.emit($crate::logger::LogKind::Log, $scope, &format!($($arg)*))
    }};
}

/// Log a highlighted message (always shown)
#[macro_export]
macro_rules! info {
    ($logger:expr, $scope:expr; $($arg:tt)*) => {{
        $logger.emit($crate::logger::LogKind::Info, $scope, &format!($($arg)*))
    }};
}

/// Log a warning (hidden only at `error` level)
#[macro_export]
macro_rules! warn {
    ($logger:expr, $scope:expr; $($arg:tt)*) => {{
        $logger.emit($crate::logger::LogKind::Warn, $scope, &format!($($arg)*))
    }};
}

/// Log an error (always shown)
#[macro_export]
macro_rules! error {
    ($logger:expr, $scope:expr; $($arg:tt)*) => {{
        $logger.emit($crate::logger::LogKind::Error, $scope, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown at `debug` level)
///
/// Formatting is skipped entirely when debug output is disabled.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $scope:expr; $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.enabled($crate::logger::LogKind::Debug) {
            logger.emit($crate::logger::LogKind::Debug, $scope, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Logger
// ============================================================================

/// Logging handle threaded through the application.
#[derive(Clone)]
pub struct Logger {
    level: LogLevel,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish()
    }
}

impl Logger {
    /// Terminal logger with the given level.
    pub fn new(level: LogLevel) -> Self {
        Self::with_sink(level, Arc::new(TerminalSink))
    }

    pub fn with_sink(level: LogLevel, sink: Arc<dyn LogSink>) -> Self {
        Self { level, sink }
    }

    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether a line of this kind passes the configured level.
    pub fn enabled(&self, kind: LogKind) -> bool {
        match kind {
            LogKind::Error | LogKind::Info | LogKind::Time => true,
            LogKind::Warn => self.level >= LogLevel::Warn,
            LogKind::Log => self.level >= LogLevel::Log,
            LogKind::Debug => self.level >= LogLevel::Debug,
        }
    }

    #[inline]
    pub fn emit(&self, kind: LogKind, scope: &str, message: &str) {
        if self.enabled(kind) {
            self.sink.write(&Record {
                kind,
                scope,
                message,
            });
        }
    }

    /// Await `fut` and log how long it took under `label`.
    pub async fn time<F: Future>(&self, scope: &str, label: &str, fut: F) -> F::Output {
        let start = Instant::now();
        let output = fut.await;
        let elapsed = start.elapsed();
        self.emit(
            LogKind::Time,
            scope,
            &format!("{label}: {:.3}ms", elapsed.as_secs_f64() * 1000.0),
        );
        output
    }
}

// ============================================================================
// Terminal Sink
// ============================================================================

/// Writes colored lines to stdout (stderr for warnings and errors).
pub struct TerminalSink;

impl LogSink for TerminalSink {
    fn write(&self, record: &Record<'_>) {
        let prefix = colorize_prefix(record.scope, record.kind);
        let line = match record.kind {
            LogKind::Error => format!("{prefix} {} {}", "(error)".red(), record.message.red()),
            LogKind::Warn => format!("{prefix} {} {}", "(warning)".yellow(), record.message),
            LogKind::Info => format!("{prefix} {}", record.message.green()),
            LogKind::Debug => format!("{prefix} {}", record.message.dimmed()),
            LogKind::Log | LogKind::Time => format!("{prefix} {}", record.message),
        };

        if matches!(record.kind, LogKind::Error | LogKind::Warn) {
            let mut out = stderr().lock();
            writeln!(out, "{line}").ok();
            out.flush().ok();
        } else {
            let mut out = stdout().lock();
            execute!(out, Clear(ClearType::UntilNewLine)).ok();
            writeln!(out, "{line}").ok();
            out.flush().ok();
        }
    }
}

/// Apply color to a scope prefix based on scope and kind
#[inline]
fn colorize_prefix(scope: &str, kind: LogKind) -> String {
    let prefix = format!("[{scope}]");
    if kind == LogKind::Error {
        return prefix.bright_red().bold().to_string();
    }
    match scope.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold().to_string(),
        "locale" => prefix.bright_green().bold().to_string(),
        "parrot" => prefix.bright_magenta().bold().to_string(),
        "build" => prefix.blue().bold().to_string(),
        "map" | "relay" => prefix.cyan().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Memory Sink (tests)
// ============================================================================

#[cfg(test)]
pub use memory::MemorySink;

#[cfg(test)]
mod memory {
    use super::{LogKind, LogLevel, LogSink, Logger, Record};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Captures records so tests can assert on output.
    #[derive(Default)]
    pub struct MemorySink {
        records: Mutex<Vec<(LogKind, String, String)>>,
    }

    impl MemorySink {
        /// Fresh logger at `debug` level plus the sink it writes to.
        pub fn logger() -> (Logger, Arc<Self>) {
            let sink = Arc::new(Self::default());
            (Logger::with_sink(LogLevel::Debug, sink.clone()), sink)
        }

        pub fn count(&self, kind: LogKind) -> usize {
            self.records.lock().iter().filter(|(k, ..)| *k == kind).count()
        }

        /// Number of lines of `kind` whose message contains `needle`.
        pub fn matching(&self, kind: LogKind, needle: &str) -> usize {
            self.records
                .lock()
                .iter()
                .filter(|(k, _, m)| *k == kind && m.contains(needle))
                .count()
        }

        pub fn messages(&self) -> Vec<String> {
            self.records.lock().iter().map(|(_, _, m)| m.clone()).collect()
        }
    }

    impl LogSink for MemorySink {
        fn write(&self, record: &Record<'_>) {
            self.records.lock().push((
                record.kind,
                record.scope.to_string(),
                record.message.to_string(),
            ));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        let (logger, _) = MemorySink::logger();
        assert!(logger.enabled(LogKind::Debug));

        let quiet = Logger::with_sink(LogLevel::Error, Arc::new(MemorySink::default()));
        assert!(quiet.enabled(LogKind::Error));
        assert!(quiet.enabled(LogKind::Info));
        assert!(!quiet.enabled(LogKind::Warn));
        assert!(!quiet.enabled(LogKind::Log));

        let normal = Logger::with_sink(LogLevel::Log, Arc::new(MemorySink::default()));
        assert!(normal.enabled(LogKind::Warn));
        assert!(normal.enabled(LogKind::Log));
        assert!(!normal.enabled(LogKind::Debug));
    }

    #[test]
    fn test_filtered_lines_not_recorded() {
        let sink = Arc::new(MemorySink::default());
        let logger = Logger::with_sink(LogLevel::Warn, sink.clone());

        crate::log!(logger, "locale"; "hidden {}", 1);
        crate::debug!(logger, "locale"; "hidden too");
        crate::warn!(logger, "locale"; "shown");

        assert_eq!(sink.messages(), vec!["shown".to_string()]);
    }

    #[tokio::test]
    async fn test_time_logs_label() {
        let (logger, sink) = MemorySink::logger();
        let value = logger.time("locale", "initializing", async { 42 }).await;

        assert_eq!(value, 42);
        assert_eq!(sink.matching(LogKind::Time, "initializing"), 1);
    }

    #[test]
    fn test_level_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let w: Wrapper = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(w.level, LogLevel::Debug);
        assert_eq!(LogLevel::default(), LogLevel::Log);
    }
}
