//! Error types for cmdtree

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cmdtree operations
pub type Result<T> = std::result::Result<T, CmdTreeError>;

/// Main error type for cmdtree
#[derive(Error, Debug)]
pub enum CmdTreeError {
    /// Command dispatch errors
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors surfaced by walking a command tree
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The node's parser rejected its arguments; holds the parser's own error
    #[error(transparent)]
    Parse(anyhow::Error),

    /// Nothing runnable at `path`: unknown subcommand, or no handler and nothing to route on
    #[error("no such command: {path}")]
    NoSuchCommand { path: String },

    /// The handler's own failure, returned untouched
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl DispatchError {
    /// Whether this is a `NoSuchCommand` failure
    pub fn is_no_such_command(&self) -> bool {
        matches!(self, DispatchError::NoSuchCommand { .. })
    }
}

/// Why a context stopped being live
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid command name '{0}'")]
    InvalidCommandName(String),

    #[error("Invalid short flag '{short}' for option '{option}'")]
    InvalidShort { option: String, short: String },

    #[error("Option name '{0}' is reserved")]
    ReservedOption(String),

    #[error("Failed to read config file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to run '{program}': {error}")]
    Spawn { program: String, error: String },

    #[error("Command interrupted: {0}")]
    Interrupted(#[from] ContextError),

    #[error("Option '{0}' is required but not provided")]
    MissingOption(String),

    #[error("Interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("Interpreter is empty")]
    EmptyInterpreter,
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

/// Specialized result type for dispatch
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_such_command_display() {
        let err = DispatchError::NoSuchCommand {
            path: "foo bar".to_string(),
        };
        assert_eq!(err.to_string(), "no such command: foo bar");
        assert!(err.is_no_such_command());
    }

    #[test]
    fn test_handler_error_is_transparent() {
        let err = DispatchError::Handler(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_no_such_command());
    }

    #[test]
    fn test_interrupted_wraps_context_error() {
        let err: ExecutionError = ContextError::DeadlineExceeded.into();
        assert_eq!(
            err.to_string(),
            "Command interrupted: context deadline exceeded"
        );
    }
}
