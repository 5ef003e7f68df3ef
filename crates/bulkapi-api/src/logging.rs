//! Logging configuration for the bulk API client
//!
//! The library only emits `tracing` events. Applications that want to see
//! them can install a subscriber themselves or use [`LogConfig`], which
//! wires up `tracing-subscriber` with optional daily-rotated file output.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FALLBACK_LEVEL: &str = "info";
const DEFAULT_LOG_FILE: &str = "bulkapi.log";

/// Log output destination
#[derive(Debug, Clone, PartialEq)]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a file with daily rotation
    File(PathBuf),
    /// Output to both stdout and file
    Both(PathBuf),
}

/// Log format style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable format (default)
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directives, e.g. `info` or `bulkapi=debug,warn`
    pub level: String,
    /// Output destination
    pub output: LogOutput,
    /// Format style
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: FALLBACK_LEVEL.to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    /// Info level to stdout
    pub fn info() -> Self {
        Self::default()
    }

    /// Debug level to stdout; shows compiled parameters and every request
    pub fn debug() -> Self {
        Self::default().with_level("debug")
    }

    /// Warn level to stdout
    pub fn warn() -> Self {
        Self::default().with_level("warn")
    }

    /// Write to a daily-rotated file instead of stdout
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Write to stdout and a daily-rotated file
    pub fn with_both<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set filter directives
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    /// Filter directives actually applied; unparsable levels fall back to
    /// `info`.
    pub fn effective_level(&self) -> &str {
        if EnvFilter::try_new(&self.level).is_ok() {
            &self.level
        } else {
            FALLBACK_LEVEL
        }
    }

    /// Install the global subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured level. Returns the
    /// file writer's guard when logging to a file; keep it alive for as long
    /// as logs should be flushed. If a global subscriber is already
    /// installed it stays in place.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use bulkapi::logging::LogConfig;
    ///
    /// let _guard = LogConfig::debug().init();
    /// ```
    pub fn init(self) -> Option<WorkerGuard> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.effective_level()));

        match self.output {
            LogOutput::Stdout => {
                install(filter, std::io::stdout, self.format);
                None
            }
            LogOutput::File(ref path) => {
                let (writer, guard) = tracing_appender::non_blocking(rolling_file(path));
                install(filter, writer, self.format);
                Some(guard)
            }
            LogOutput::Both(ref path) => {
                let (writer, guard) = tracing_appender::non_blocking(rolling_file(path));
                let installed = tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .with(fmt::layer().with_writer(writer).compact())
                    .try_init();
                if installed.is_err() {
                    tracing::debug!("global subscriber already installed");
                }
                Some(guard)
            }
        }
    }
}

fn rolling_file(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    tracing_appender::rolling::daily(dir, file)
}

fn install<W>(filter: EnvFilter, writer: W, format: LogFormat)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(writer).pretty())
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().with_writer(writer).compact())
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
