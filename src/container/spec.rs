//! Container specification
//!
//! A `ContainerSpec` is a lazily evaluated description of a container. Each
//! `with_*` call returns a new spec; nothing touches a container engine until
//! the spec is handed to a [`ContainerEngine`](crate::engine::ContainerEngine).

use crate::source::SourceDir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directory copied into the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCopy {
    /// Destination inside the container
    pub path: String,
    /// Source tree on the host
    pub source: SourceDir,
}

/// Persistent cache volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMount {
    /// Mount point inside the container
    pub path: String,
    /// Volume name
    pub volume: String,
}

/// A command to run, with the workdir and environment in effect when it
/// was added
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecStep {
    pub args: Vec<String>,
    pub workdir: String,
    pub env: BTreeMap<String, String>,
}

impl ExecStep {
    /// Command line for messages
    pub fn display(&self) -> String {
        self.args.join(" ")
    }
}

/// Container specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Base image
    pub image: String,
    /// Directories copied in, in order
    pub directories: Vec<DirectoryCopy>,
    /// Cache volumes
    pub caches: Vec<CacheMount>,
    /// Current working directory
    pub workdir: String,
    /// Current environment
    pub env: BTreeMap<String, String>,
    /// Commands, in order
    pub steps: Vec<ExecStep>,
}

impl ContainerSpec {
    /// Start a spec from a base image
    pub fn from(image: &str) -> Self {
        Self {
            image: image.to_string(),
            directories: Vec::new(),
            caches: Vec::new(),
            workdir: "/".to_string(),
            env: BTreeMap::new(),
            steps: Vec::new(),
        }
    }

    /// Copy a directory into the container
    pub fn with_directory(mut self, path: &str, source: &SourceDir) -> Self {
        self.directories.push(DirectoryCopy {
            path: path.to_string(),
            source: source.clone(),
        });
        self
    }

    /// Mount a cache volume
    pub fn with_mounted_cache(mut self, path: &str, volume: &str) -> Self {
        self.caches.push(CacheMount {
            path: path.to_string(),
            volume: volume.to_string(),
        });
        self
    }

    /// Set the working directory for subsequent commands
    pub fn with_workdir(mut self, dir: &str) -> Self {
        self.workdir = dir.to_string();
        self
    }

    /// Set an environment variable for subsequent commands
    pub fn with_env_variable(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Append a command
    pub fn with_exec<S: AsRef<str>>(mut self, args: &[S]) -> Self {
        self.steps.push(ExecStep {
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            workdir: self.workdir.clone(),
            env: self.env.clone(),
        });
        self
    }

    /// Last command, whose output the engine returns
    pub fn last_step(&self) -> Option<&ExecStep> {
        self.steps.last()
    }
}
