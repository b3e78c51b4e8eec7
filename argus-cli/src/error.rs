//! CLI-specific error types and exit code mapping

use argus_core::error::{ArgusError, ScenarioError};

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// At least one suite had a failing setup, test or teardown.
    #[error("{failed} of {total} scenario(s) failed")]
    SuitesFailed { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from argus-core.
    #[error("{0}")]
    Core(#[from] ArgusError),
}

impl From<ScenarioError> for CliError {
    fn from(e: ScenarioError) -> Self {
        Self::Core(e.into())
    }
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | General / command error, failed suite |
    /// | 2    | Configuration error                   |
    /// | 10   | IO error                              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(ArgusError::Config(_)) => 2,
            Self::Io(_) => 10,
            Self::Command(_) | Self::SuitesFailed { .. } | Self::JsonSerialize(_) | Self::Core(_) => 1,
        }
    }
}
