//! Container module
//!
//! This module describes the containers the pipeline runs in. Specs are
//! plain data; evaluating them is the job of the `engine` module.

pub mod spec;

pub use spec::{CacheMount, ContainerSpec, DirectoryCopy, ExecStep};
