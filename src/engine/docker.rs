//! Docker CLI engine
//!
//! Evaluates a spec with plain `docker` commands:
//!
//! 1. `docker create` an idle container from the base image
//! 2. `docker cp` every directory into it
//! 3. `docker start`
//! 4. `docker exec` each step, stopping at the first failure
//! 5. `docker rm -f`, whatever happened before

use super::{ContainerEngine, ExecOutput};
use crate::container::{ContainerSpec, DirectoryCopy, ExecStep};
use crate::error::{CiError, Result};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default docker binary
pub const DEFAULT_DOCKER_BIN: &str = "docker";

/// Label put on every container the engine creates
pub const CONTAINER_LABEL: &str = "powerbuddy-ci=1";

/// Engine backed by the docker CLI
#[derive(Debug, Clone)]
pub struct DockerEngine {
    /// Path to the docker binary
    binary: PathBuf,
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_BIN)
    }
}

impl DockerEngine {
    /// Create an engine using the given docker binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run one docker command and capture its output
    async fn docker(&self, args: &[String]) -> Result<ExecOutput> {
        debug!("docker {}", args.join(" "));

        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CiError::EngineUnavailable(format!(
                        "{} not found",
                        self.binary.display()
                    ))
                } else {
                    CiError::Io(e)
                }
            })?;

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Run a docker management command; non-zero exit is an engine error
    async fn checked(&self, args: &[String]) -> Result<ExecOutput> {
        let output = self.docker(args).await?;
        if !output.success() {
            return Err(CiError::Engine(format!(
                "docker {} failed: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.stderr.trim()
            )));
        }
        Ok(output)
    }

    async fn run_steps(&self, spec: &ContainerSpec, name: &str) -> Result<ExecOutput> {
        for copy in &spec.directories {
            self.checked(&cp_args(copy, name)).await?;
        }

        self.checked(&start_args(name)).await?;

        let mut last = ExecOutput::default();
        for step in &spec.steps {
            info!("Running `{}` in {}", step.display(), step.workdir);
            let output = self.docker(&exec_args(step, name)).await?;

            if !output.success() {
                return Err(CiError::ExecFailed {
                    command: step.display(),
                    exit_code: output.exit_code,
                    stdout: output.stdout.trim_end().to_string(),
                    stderr: output.stderr.trim_end().to_string(),
                });
            }

            debug!("`{}` finished: {} bytes of stdout", step.display(), output.stdout.len());
            last = output;
        }

        Ok(last)
    }
}

impl ContainerEngine for DockerEngine {
    async fn run(&self, spec: &ContainerSpec) -> Result<ExecOutput> {
        if spec.steps.is_empty() {
            return Err(CiError::NothingToRun);
        }

        let name = container_name();
        info!("Creating container {} from {}", name, spec.image);
        self.checked(&create_args(spec, &name)).await?;

        let result = self.run_steps(spec, &name).await;

        match self.docker(&rm_args(&name)).await {
            Ok(output) if !output.success() => {
                warn!("Failed to remove container {}: {}", name, output.stderr.trim())
            }
            Err(e) => warn!("Failed to remove container {}: {}", name, e),
            Ok(_) => debug!("Removed container {}", name),
        }

        result
    }
}

/// Generate a container name
fn container_name() -> String {
    format!("powerbuddy-{}", &Uuid::new_v4().simple().to_string()[..8])
}

/// `docker create` arguments for an idle container
pub fn create_args(spec: &ContainerSpec, name: &str) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "--name".to_string(),
        name.to_string(),
        "--label".to_string(),
        CONTAINER_LABEL.to_string(),
    ];

    for cache in &spec.caches {
        args.push("-v".to_string());
        args.push(format!("{}:{}", cache.volume, cache.path));
    }

    args.extend([
        "--entrypoint".to_string(),
        "sleep".to_string(),
        spec.image.clone(),
        "infinity".to_string(),
    ]);
    args
}

/// `docker cp` arguments copying a directory's contents
pub fn cp_args(copy: &DirectoryCopy, name: &str) -> Vec<String> {
    vec![
        "cp".to_string(),
        format!("{}/.", copy.source.root().display()),
        format!("{}:{}", name, copy.path),
    ]
}

/// `docker start` arguments
pub fn start_args(name: &str) -> Vec<String> {
    vec!["start".to_string(), name.to_string()]
}

/// `docker exec` arguments for one step
pub fn exec_args(step: &ExecStep, name: &str) -> Vec<String> {
    let mut args = vec!["exec".to_string(), "-w".to_string(), step.workdir.clone()];

    for (key, value) in &step.env {
        args.push("-e".to_string());
        args.push(format!("{}={}", key, value));
    }

    args.push(name.to_string());
    args.extend(step.args.iter().cloned());
    args
}

/// `docker rm -f` arguments
pub fn rm_args(name: &str) -> Vec<String> {
    vec!["rm".to_string(), "-f".to_string(), name.to_string()]
}
