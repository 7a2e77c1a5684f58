//! Error types for powerbuddy-ci

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, CiError>;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum CiError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid runtime version: {0:?}")]
    InvalidVersion(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Container engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Container engine error: {0}")]
    Engine(String),

    #[error("Command `{command}` exited with code {exit_code}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    ExecFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Container has no commands to run")]
    NothingToRun,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
