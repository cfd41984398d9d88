//! Subscriber setup for hosts that embed the scheduler without their own.
//!
//! Scheduler events are emitted under the `danci_srs` target. A bare level
//! such as `debug` is scoped to that target so host crates stay quiet.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target of every event this crate emits.
pub const LOG_TARGET: &str = env!("CARGO_CRATE_NAME");

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_FILE_NAME: &str = "danci-srs.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// A bare level or full `EnvFilter` directives
    pub filter: String,
    /// Daily rolling file output is enabled when set
    pub file_dir: Option<PathBuf>,
    pub file_name: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LEVEL.to_string(),
            file_dir: None,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl LogSettings {
    /// Reads `SRS_LOG`, `SRS_LOG_DIR` and `SRS_LOG_FILE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            filter: non_empty_env("SRS_LOG").unwrap_or(defaults.filter),
            file_dir: non_empty_env("SRS_LOG_DIR").map(PathBuf::from),
            file_name: non_empty_env("SRS_LOG_FILE").unwrap_or(defaults.file_name),
        }
    }

    pub fn with_file(mut self, dir: impl Into<PathBuf>) -> Self {
        self.file_dir = Some(dir.into());
        self
    }

    /// `EnvFilter` directives with bare levels scoped to [`LOG_TARGET`].
    pub fn directives(&self) -> String {
        let filter = self.filter.trim();
        if filter.parse::<tracing::Level>().is_ok() {
            format!("{LOG_TARGET}={}", filter.to_ascii_lowercase())
        } else {
            filter.to_string()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.directives())
            .unwrap_or_else(|_| EnvFilter::new(format!("{LOG_TARGET}={DEFAULT_LEVEL}")))
    }
}

/// Keeps the file writer alive; dropping it flushes buffered file logs.
pub struct TracingGuard {
    installed: bool,
    _file: Option<WorkerGuard>,
}

impl TracingGuard {
    /// False when another global subscriber was already in place.
    pub fn installed(&self) -> bool {
        self.installed
    }
}

pub fn init_tracing(settings: &LogSettings) -> TracingGuard {
    let stdout_layer = fmt::layer().with_target(true);

    let (file_layer, file_guard) = match settings.file_dir.as_deref() {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, dir, &settings.file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(err) => {
                eprintln!("failed to create log directory {}: {err}", dir.display());
                (None, None)
            }
        },
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(settings.env_filter())
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    TracingGuard {
        installed,
        _file: file_guard.filter(|_| installed),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
