use anyhow::Context;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Global tracing bootstrap for hosts that route kernel logs through
/// the stock `TracingSink`. Stdout by default; rolling files when a
/// directory is configured.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Max level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Write rolling log files into this directory instead of stdout.
    pub file_dir: Option<String>,
    /// Filename prefix for rolling files.
    pub file_prefix: Option<String>,
    /// Rotation: `minutely`, `hourly` or `daily`.
    pub rolling: Option<String>,
    /// How many rolled files to keep.
    pub max_files: usize,
}

impl LoggerConfig {
    /// Read the configuration from `LOG_LEVEL`, `LOG_FILE_DIR`,
    /// `LOG_FILE_PREFIX` and `LOG_ROLLING`, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            file_dir: std::env::var("LOG_FILE_DIR").ok(),
            file_prefix: std::env::var("LOG_FILE_PREFIX").ok(),
            rolling: std::env::var("LOG_ROLLING").ok(),
            ..Self::default()
        }
    }

    fn rotation(&self) -> Rotation {
        match self.rolling.as_deref() {
            Some("minutely") => Rotation::MINUTELY,
            Some("hourly") => Rotation::HOURLY,
            _ => Rotation::DAILY,
        }
    }

    /// Install the global subscriber. Returns the appender worker
    /// guard when logging to files; the caller must keep it alive.
    /// Installing twice is harmless (the second call loses).
    pub fn init(&self) -> anyhow::Result<Option<WorkerGuard>> {
        let level = Level::from_str(&self.level).unwrap_or(Level::INFO);

        let Some(dir) = self.file_dir.as_deref() else {
            let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
            return Ok(None);
        };

        let appender: RollingFileAppender = RollingFileAppender::builder()
            .rotation(self.rotation())
            .max_log_files(self.max_files)
            .filename_prefix(self.file_prefix.as_deref().unwrap_or(""))
            .build(dir)
            .with_context(|| format!("failed to create rolling appender in {dir}"))?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(writer)
            .try_init();

        tracing::info!("logging to {dir} ({:?} rotation)", self.rotation());
        Ok(Some(guard))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_dir: None,
            file_prefix: None,
            rolling: None,
            max_files: 2,
        }
    }
}
