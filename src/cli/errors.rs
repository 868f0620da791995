//! CLI error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::error::GhostError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Scenario file missing, malformed or inconsistent
    ScenarioError,
    /// A scripted operation failed
    OperationFailed,
    /// I/O error (stdout, files)
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "GHOST_CLI_CONFIG_ERROR",
            Self::ScenarioError => "GHOST_CLI_SCENARIO_ERROR",
            Self::OperationFailed => "GHOST_CLI_OPERATION_FAILED",
            Self::IoError => "GHOST_CLI_IO_ERROR",
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
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn scenario_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ScenarioError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

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

impl From<GhostError> for CliError {
    fn from(e: GhostError) -> Self {
        let code = match &e {
            GhostError::Config(_) => CliErrorCode::ConfigError,
            GhostError::Scenario(_) | GhostError::Json(_) => CliErrorCode::ScenarioError,
            GhostError::Io(_) => CliErrorCode::IoError,
            _ => CliErrorCode::OperationFailed,
        };
        Self::new(code, format!("{} ({})", e, e.code()))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
