use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing::debug;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput<'a> {
    File(&'a str),
    Console,
    Discard,
}

impl<'a> LogOutput<'a> {
    /// File output takes precedence over console output when both are enabled.
    pub fn from_config(config: &'a LoggingConfig) -> Self {
        match (config.log_to_file, config.log_file_path.as_deref()) {
            (true, Some(path)) => LogOutput::File(path),
            _ if config.log_to_console => LogOutput::Console,
            _ => LogOutput::Discard,
        }
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// Returns `Ok(false)` if a global subscriber was already installed, so tests
/// and embedding applications can call this more than once.
///
/// # Errors
/// Returns `ProtocolError::ConfigError` if the log file cannot be opened
pub fn init(config: &LoggingConfig) -> Result<bool> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false);

    let installed = match LogOutput::from_config(config) {
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ProtocolError::ConfigError(format!("Failed to open log file: {e}")))?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            if config.json_format {
                builder.json().try_init().is_ok()
            } else {
                builder.try_init().is_ok()
            }
        }
        LogOutput::Console if config.json_format => builder.json().try_init().is_ok(),
        LogOutput::Console => builder.try_init().is_ok(),
        LogOutput::Discard => builder.with_writer(io::sink).try_init().is_ok(),
    };

    if installed {
        debug!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    }
    Ok(installed)
}
