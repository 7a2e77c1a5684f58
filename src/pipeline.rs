//! The Powerbuddy pipeline
//!
//! `build_env` describes the development environment and `test` runs the
//! test suite in it. `test` always goes through `build_env`, so both see the
//! same image, copies and install step.

use crate::config::PipelineConfig;
use crate::container::ContainerSpec;
use crate::engine::ContainerEngine;
use crate::error::{CiError, Result};
use crate::source::SourceDir;
use tracing::info;

/// Pipeline bound to a container engine
pub struct Powerbuddy<E> {
    config: PipelineConfig,
    engine: E,
}

impl<E: ContainerEngine> Powerbuddy<E> {
    /// Create a pipeline
    pub fn new(config: PipelineConfig, engine: E) -> Self {
        Self { config, engine }
    }

    /// Container engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Read the pinned runtime version from the source tree
    pub fn runtime_version(&self, source: &SourceDir) -> Result<String> {
        let contents = source.file_contents(&self.config.version_file)?;
        let version = contents.trim();

        if version.is_empty() || version.contains(char::is_whitespace) {
            return Err(CiError::InvalidVersion(version.to_string()));
        }

        Ok(version.to_string())
    }

    /// Describe the development environment: base image, source tree,
    /// working directory and the dependency install step.
    ///
    /// Fails without describing anything if the version file is unreadable.
    pub fn build_env(&self, source: &SourceDir) -> Result<ContainerSpec> {
        let version = self.runtime_version(source)?;
        let image = self.config.image_for(&version);
        info!("Runtime version {} -> base image {}", version, image);

        let mut spec = ContainerSpec::from(&image);
        if self.config.cache.enabled {
            spec = spec.with_mounted_cache(
                &self.config.cache.path,
                &self.config.cache_volume_for(&version),
            );
        }

        Ok(spec
            .with_directory(&self.config.mount_path, source)
            .with_workdir(&self.config.workdir)
            .with_exec(&self.config.install_command))
    }

    /// Describe the test run: the environment plus the test command
    pub fn test_spec(&self, source: &SourceDir) -> Result<ContainerSpec> {
        Ok(self
            .build_env(source)?
            .with_exec(&self.config.test_command))
    }

    /// Build the environment and return the install step's output
    pub async fn run_build_env(&self, source: &SourceDir) -> Result<String> {
        let spec = self.build_env(source)?;
        self.engine.stdout(&spec).await
    }

    /// Run the tests and return their standard output
    pub async fn test(&self, source: &SourceDir) -> Result<String> {
        let spec = self.test_spec(source)?;
        info!("Running tests in {}", spec.image);
        self.engine.stdout(&spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecOutput;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Engine that records specs and replies with a canned result
    struct RecordingEngine {
        seen: Mutex<Vec<ContainerSpec>>,
        reply: fn(&ContainerSpec) -> Result<ExecOutput>,
    }

    impl RecordingEngine {
        fn new(reply: fn(&ContainerSpec) -> Result<ExecOutput>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn echo() -> Self {
            Self::new(|spec| {
                Ok(ExecOutput {
                    stdout: spec.last_step().map(|s| s.display()).unwrap_or_default(),
                    ..Default::default()
                })
            })
        }

        fn seen(&self) -> Vec<ContainerSpec> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ContainerEngine for RecordingEngine {
        async fn run(&self, spec: &ContainerSpec) -> Result<ExecOutput> {
            self.seen.lock().unwrap().push(spec.clone());
            (self.reply)(spec)
        }
    }

    fn worker_tree(version: &str) -> (TempDir, SourceDir) {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("worker")).unwrap();
        std::fs::write(temp.path().join("worker/.node-version"), version).unwrap();
        std::fs::write(temp.path().join("worker/package.json"), "{}").unwrap();
        let source = SourceDir::open(temp.path()).unwrap();
        (temp, source)
    }

    #[test]
    fn test_base_image_from_version_file() {
        let (_temp, source) = worker_tree("18.20.0\n");
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        let spec = pipeline.build_env(&source).unwrap();
        assert_eq!(spec.image, "node:18.20.0-slim");
    }

    #[test]
    fn test_build_env_layout() {
        let (_temp, source) = worker_tree("  20.11.1 \r\n");
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        let spec = pipeline.build_env(&source).unwrap();
        assert_eq!(spec.image, "node:20.11.1-slim");
        assert_eq!(spec.directories.len(), 1);
        assert_eq!(spec.directories[0].path, "/src");
        assert_eq!(spec.directories[0].source, source);
        assert_eq!(spec.workdir, "/src/worker");
        assert_eq!(spec.steps.len(), 1);
        assert_eq!(spec.steps[0].args, vec!["yarn"]);
        assert_eq!(spec.steps[0].workdir, "/src/worker");
        assert_eq!(spec.caches[0].volume, "powerbuddy-yarn-20.11.1");
    }

    #[test]
    fn test_build_env_without_cache() {
        let (_temp, source) = worker_tree("18.20.0");
        let config = PipelineConfig::default().without_cache();
        let pipeline = Powerbuddy::new(config, RecordingEngine::echo());

        let spec = pipeline.build_env(&source).unwrap();
        assert!(spec.caches.is_empty());
    }

    #[test]
    fn test_missing_version_file() {
        let temp = tempdir().unwrap();
        let source = SourceDir::open(temp.path()).unwrap();
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        let err = pipeline.build_env(&source).unwrap_err();
        assert!(matches!(err, CiError::FileRead { .. }));
    }

    #[test]
    fn test_blank_version_file() {
        let (_temp, source) = worker_tree(" \n");
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        let err = pipeline.build_env(&source).unwrap_err();
        assert!(matches!(err, CiError::InvalidVersion(_)));
    }

    #[test]
    fn test_test_spec_extends_build_env() {
        let (_temp, source) = worker_tree("18.20.0\n");
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        let env = pipeline.build_env(&source).unwrap();
        let test = pipeline.test_spec(&source).unwrap();

        assert_eq!(test.steps.len(), env.steps.len() + 1);
        assert_eq!(test.steps[..env.steps.len()], env.steps[..]);
        assert_eq!(test.image, env.image);
        assert_eq!(test.directories, env.directories);
        assert_eq!(test.last_step().unwrap().args, vec!["yarn", "test", "--run"]);
    }

    #[tokio::test]
    async fn test_returns_stdout() {
        let (_temp, source) = worker_tree("18.20.0\n");
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        let stdout = pipeline.test(&source).await.unwrap();
        assert_eq!(stdout, "yarn test --run");

        let seen = pipeline.engine().seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].image, "node:18.20.0-slim");
    }

    #[tokio::test]
    async fn test_build_failure_skips_engine() {
        let temp = tempdir().unwrap();
        let source = SourceDir::open(temp.path()).unwrap();
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        let err = pipeline.test(&source).await.unwrap_err();
        assert!(matches!(err, CiError::FileRead { .. }));
        assert!(pipeline.engine().seen().is_empty());
    }

    #[tokio::test]
    async fn test_exec_failure_propagates() {
        let (_temp, source) = worker_tree("18.20.0\n");
        let engine = RecordingEngine::new(|spec| {
            Err(CiError::ExecFailed {
                command: spec.last_step().map(|s| s.display()).unwrap_or_default(),
                exit_code: 1,
                stdout: "FAIL src/lamp.spec.ts".to_string(),
                stderr: "1 test failed".to_string(),
            })
        });
        let pipeline = Powerbuddy::new(PipelineConfig::default(), engine);

        match pipeline.test(&source).await.unwrap_err() {
            CiError::ExecFailed {
                command,
                exit_code,
                stdout,
                ..
            } => {
                assert_eq!(command, "yarn test --run");
                assert_eq!(exit_code, 1);
                assert_eq!(stdout, "FAIL src/lamp.spec.ts");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_build_env() {
        let (_temp, source) = worker_tree("18.20.0\n");
        let pipeline = Powerbuddy::new(PipelineConfig::default(), RecordingEngine::echo());

        assert_eq!(pipeline.run_build_env(&source).await.unwrap(), "yarn");
    }
}
