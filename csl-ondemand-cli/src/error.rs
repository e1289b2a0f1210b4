//! CLI error types.

use std::fmt;
use std::path::PathBuf;

use csl_ondemand::config::ConfigError;
use csl_ondemand::logging::LoggingError;
use csl_ondemand::CslError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Missing or inconsistent settings.
    Config(String),

    /// The configuration file could not be read or written.
    ConfigFile(ConfigError),

    /// Logging could not be initialized.
    Logging(LoggingError),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(String),

    /// A core operation failed.
    Service(CslError),

    /// The HTTP server failed to bind or terminated with an error.
    Server(String),

    /// The Ctrl-C handler could not be installed.
    Signal(String),

    /// Writing bundle output failed.
    Output { path: PathBuf, source: std::io::Error },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::ConfigFile(_) => 2,
            CliError::Service(e) if e.is_not_found() => 3,
            CliError::Service(e) if e.is_cancelled() => 130,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration file error: {}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::RuntimeCreation(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Server(msg) => write!(f, "Server error: {}", msg),
            CliError::Signal(msg) => write!(f, "Failed to install Ctrl-C handler: {}", msg),
            CliError::Output { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Service(e) => Some(e),
            CliError::Output { source, .. } => Some(source),
            CliError::Config(_)
            | CliError::RuntimeCreation(_)
            | CliError::Server(_)
            | CliError::Signal(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<CslError> for CliError {
    fn from(e: CslError) -> Self {
        CliError::Service(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CliError::Config("resources root is not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: resources root is not set");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config(String::new()).exit_code(), 2);
        let not_found = CliError::from(CslError::AircraftNotFound {
            root: "C172".into(),
            id: "X".into(),
        });
        assert_eq!(not_found.exit_code(), 3);
        assert_eq!(CliError::from(CslError::Cancelled).exit_code(), 130);
        assert_eq!(CliError::Server("bind".into()).exit_code(), 1);
    }
}
