//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::sequencer::{SequencerError, SpecError};

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Operation spec could not be parsed
    SpecError,
    /// Base dataset or operation JSON could not be parsed
    InputError,
    /// A stage failed while running
    RunFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CHARTSTEP_CLI_CONFIG_ERROR",
            Self::IoError => "CHARTSTEP_CLI_IO_ERROR",
            Self::SpecError => "CHARTSTEP_CLI_SPEC_ERROR",
            Self::InputError => "CHARTSTEP_CLI_INPUT_ERROR",
            Self::RunFailed => "CHARTSTEP_CLI_RUN_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Input parse error
    pub fn input_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InputError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(format!("{} ({})", e, e.code()))
    }
}

impl From<SpecError> for CliError {
    fn from(e: SpecError) -> Self {
        Self::new(CliErrorCode::SpecError, format!("{} ({})", e, e.code()))
    }
}

impl From<SequencerError> for CliError {
    fn from(e: SequencerError) -> Self {
        Self::new(CliErrorCode::RunFailed, format!("{} ({})", e, e.code()))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::input_error("bad row");
        assert_eq!(err.to_string(), "CHARTSTEP_CLI_INPUT_ERROR: bad row");
        assert_eq!(err.message(), "bad row");
    }

    #[test]
    fn test_from_sequencer_error() {
        let err: CliError = SequencerError::Exhausted.into();
        assert_eq!(err.code(), &CliErrorCode::RunFailed);
        assert!(err.message().contains("CHARTSTEP_EXHAUSTED"));
    }
}
