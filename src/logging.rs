// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `TG_ENGINE_LOG_LEVEL` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! The level is resolved once into a [`LogSettings`] value and handed to the
//! subscriber; nothing changes it afterwards. Logs go to STDERR so stdout
//! stays free for command output.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no CLI level is given.
pub const LOG_LEVEL_ENV: &str = "TG_ENGINE_LOG_LEVEL";

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: tracing::Level,
    /// Raw env value that could not be parsed, reported once logging is up.
    pub rejected: Option<String>,
}

impl LogSettings {
    /// Resolve settings from the CLI flag and the given env value.
    pub fn resolve(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Self {
        if let Some(lvl) = cli_level {
            return Self {
                level: level_from_log_level(lvl),
                rejected: None,
            };
        }

        match env_value.map(str::trim).filter(|s| !s.is_empty()) {
            None => Self {
                level: tracing::Level::INFO,
                rejected: None,
            },
            Some(raw) => match parse_level_str(raw) {
                Some(level) => Self {
                    level,
                    rejected: None,
                },
                None => Self {
                    level: tracing::Level::INFO,
                    rejected: Some(raw.to_string()),
                },
            },
        }
    }

    pub fn from_env(cli_level: Option<LogLevel>) -> Self {
        let env_value = std::env::var(LOG_LEVEL_ENV).ok();
        Self::resolve(cli_level, env_value.as_deref())
    }
}

/// Initialise the global logging subscriber.
///
/// Call once at startup.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    fmt()
        .with_max_level(settings.level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    if let Some(raw) = &settings.rejected {
        tracing::warn!(
            value = %raw,
            env = LOG_LEVEL_ENV,
            "unrecognised log level; falling back to info"
        );
    }

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

/// Parse a level name. `fatal` and `panic` are accepted for compatibility
/// with hosts that use those names and map to `error`.
fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "panic" | "fatal" | "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
