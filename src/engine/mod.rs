//! Container engines
//!
//! An engine evaluates a [`ContainerSpec`]: it creates the container, copies
//! directories in, runs every step in order and returns the output of the
//! last one.

pub mod docker;

use crate::container::ContainerSpec;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

pub use docker::DockerEngine;

/// Captured output of a command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    /// Whether the command exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Something that can evaluate a container spec
pub trait ContainerEngine: Send + Sync {
    /// Run all steps of `spec` and return the output of the last step.
    ///
    /// Fails with `CiError::NothingToRun` for a spec without steps and with
    /// `CiError::ExecFailed` at the first step that exits non-zero.
    fn run(&self, spec: &ContainerSpec) -> impl Future<Output = Result<ExecOutput>> + Send;

    /// Standard output of the last step
    fn stdout(&self, spec: &ContainerSpec) -> impl Future<Output = Result<String>> + Send {
        async move { self.run(spec).await.map(|output| output.stdout) }
    }
}
