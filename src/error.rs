//! Error types for Taskhook

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Taskhook operations
pub type Result<T> = std::result::Result<T, TaskhookError>;

/// Main error type for Taskhook
#[derive(Error, Debug)]
pub enum TaskhookError {
    /// Configuration and registration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task invocation errors
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Command-line parsing errors
    #[error(transparent)]
    Cli(#[from] clap::Error),
}

/// Configuration parsing, task registration and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    #[error("Task '{name}' is already defined in namespace '{namespace}'")]
    DuplicateTask { namespace: String, name: String },

    #[error("Collection '{name}' is already defined in namespace '{namespace}'")]
    DuplicateCollection { namespace: String, name: String },

    #[error("Task '{task}' names unknown parameter '{param}' in its '{option}' option")]
    UnknownParameter {
        task: String,
        option: &'static str,
        param: String,
    },

    #[error("Task '{task}' wants command name '{name}', which is already taken")]
    CommandCollision { task: String, name: String },

    #[error("Task '{task}' sets flags for positional parameter '{param}'")]
    PositionalFlags { task: String, param: String },

    #[error("Task '{task}' uses flag '{flag}' more than once")]
    FlagCollision { task: String, flag: String },

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),
}

/// Errors raised while mapping call arguments onto a task's parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Missing required argument: {param} (task '{task}')")]
    MissingArgument { task: String, param: String },

    #[error("Got multiple values for argument '{param}' (task '{task}')")]
    MultipleValues { task: String, param: String },

    #[error("Task '{task}' takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        task: String,
        expected: usize,
        given: usize,
    },

    #[error("Task '{task}' got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { task: String, name: String },
}

/// Errors returned by a task invocation
#[derive(Error, Debug)]
pub enum InvokeError {
    /// Arguments could not be bound to the task's parameters
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    /// The task body itself failed; the error is passed through untouched
    #[error(transparent)]
    Task(anyhow::Error),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for invocation operations
pub type InvokeResult<T> = std::result::Result<T, InvokeError>;

impl InvokeError {
    /// Borrow the body error when the failure came from the task body
    pub fn task_error(&self) -> Option<&anyhow::Error> {
        match self {
            InvokeError::Task(err) => Some(err),
            InvokeError::Binding(_) => None,
        }
    }
}
