//! Pipeline configuration
//!
//! Defaults describe the Powerbuddy worker: a Node.js project under
//! `worker/` whose runtime version is pinned in `worker/.node-version` and
//! whose dependencies are managed by yarn. Any field can be overridden from
//! a YAML file; missing fields keep their defaults.

use crate::error::{CiError, Result};
use crate::source::SourceDir;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Config file looked up in the source root when none is given
pub const DEFAULT_CONFIG_FILE: &str = "powerbuddy-ci.yaml";

/// Placeholder substituted with the runtime version in `base_image`
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Version-marker file, relative to the source root
    pub version_file: String,
    /// Base image template, must contain `{version}`
    pub base_image: String,
    /// Where the source tree is copied inside the container
    pub mount_path: String,
    /// Working directory for all commands
    pub workdir: String,
    /// Dependency install command
    pub install_command: Vec<String>,
    /// Test command
    pub test_command: Vec<String>,
    /// Dependency cache
    pub cache: CacheConfig,
}

/// Dependency cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Mount a persistent cache volume for the install step
    pub enabled: bool,
    /// Cache directory inside the container
    pub path: String,
    /// Volume name prefix; the runtime version is appended
    pub volume_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version_file: "worker/.node-version".to_string(),
            base_image: "node:{version}-slim".to_string(),
            mount_path: "/src".to_string(),
            workdir: "/src/worker".to_string(),
            install_command: vec!["yarn".to_string()],
            test_command: vec!["yarn".to_string(), "test".to_string(), "--run".to_string()],
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/usr/local/share/.cache/yarn".to_string(),
            volume_prefix: "powerbuddy-yarn".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML config and validate it
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CiError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Resolve the config for a run: `explicit` if given, else
    /// `powerbuddy-ci.yaml` in the source root, else the defaults.
    /// `no_cache` turns the dependency cache off whatever the file says.
    pub fn discover(explicit: Option<&Path>, source: &SourceDir, no_cache: bool) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None if source.contains(DEFAULT_CONFIG_FILE) => {
                let path = source.resolve(DEFAULT_CONFIG_FILE)?;
                debug!("Using config {}", path.display());
                Self::load(&path)?
            }
            None => Self::default(),
        };

        Ok(if no_cache { config.without_cache() } else { config })
    }

    /// Disable the dependency cache
    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    /// Check the configuration for values the pipeline cannot use
    pub fn validate(&self) -> Result<()> {
        if !self.base_image.contains(VERSION_PLACEHOLDER) {
            return Err(CiError::InvalidConfig(format!(
                "base_image `{}` has no {} placeholder",
                self.base_image, VERSION_PLACEHOLDER
            )));
        }
        if self.version_file.trim().is_empty() {
            return Err(CiError::InvalidConfig("version_file is empty".to_string()));
        }
        if !self.mount_path.starts_with('/') || !self.workdir.starts_with('/') {
            return Err(CiError::InvalidConfig(
                "mount_path and workdir must be absolute".to_string(),
            ));
        }
        if self.install_command.is_empty() || self.test_command.is_empty() {
            return Err(CiError::InvalidConfig(
                "install_command and test_command must not be empty".to_string(),
            ));
        }
        if self.cache.enabled && !self.cache.path.starts_with('/') {
            return Err(CiError::InvalidConfig(
                "cache.path must be absolute".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the base image name for a runtime version
    pub fn image_for(&self, version: &str) -> String {
        self.base_image.replace(VERSION_PLACEHOLDER, version)
    }

    /// Name of the cache volume for a runtime version
    pub fn cache_volume_for(&self, version: &str) -> String {
        format!("{}-{}", self.cache.volume_prefix, version)
    }
}
