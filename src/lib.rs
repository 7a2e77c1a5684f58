//! powerbuddy-ci - Containerized build and test pipeline for Powerbuddy
//!
//! The pipeline has two operations:
//!
//! - `build_env`: pick a Node.js base image from the pinned version file,
//!   copy the source tree in and install dependencies
//! - `test`: run the test suite inside that environment and return its stdout
//!
//! Containers are described lazily with [`ContainerSpec`] and evaluated by a
//! [`ContainerEngine`], by default the Docker CLI.

pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod source;

pub use config::PipelineConfig;
pub use container::ContainerSpec;
pub use engine::{ContainerEngine, DockerEngine, ExecOutput};
pub use error::{CiError, Result};
pub use pipeline::Powerbuddy;
pub use source::SourceDir;
