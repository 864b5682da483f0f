//! CLI error handling

use std::fmt;

use beacon_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(beacon_errors::ConfigError),
    /// Error from the pipeline crates
    Core(beacon_errors::Error),
    /// Sink construction error
    Sink(beacon_errors::SinkError),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

fn write_user_facing(f: &mut fmt::Formatter<'_>, e: &dyn UserFacingError) -> fmt::Result {
    write!(f, "{}", e.user_message())?;
    if let Some(code) = e.user_code() {
        write!(f, "\n  Code: {code}")?;
    }
    if let Some(hint) = e.user_hint() {
        write!(f, "\n  Hint: {hint}")?;
    }
    if e.is_retryable() {
        write!(f, "\n  Retry: safe to retry this operation.")?;
    }
    Ok(())
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => {
                write!(f, "Configuration error: ")?;
                write_user_facing(f, e)
            }
            CliError::Core(e) => write_user_facing(f, e),
            CliError::Sink(e) => {
                write!(f, "Sink error: ")?;
                write_user_facing(f, e)
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Core(e) => Some(e),
            CliError::Sink(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<beacon_errors::ConfigError> for CliError {
    fn from(e: beacon_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<beacon_errors::Error> for CliError {
    fn from(e: beacon_errors::Error) -> Self {
        match e {
            beacon_errors::Error::Config(config) => CliError::Config(config),
            other => CliError::Core(other),
        }
    }
}

impl From<beacon_errors::SinkError> for CliError {
    fn from(e: beacon_errors::SinkError) -> Self {
        CliError::Sink(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
