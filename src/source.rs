//! Source directory handle

use crate::error::{CiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Handle to the source tree the pipeline works on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDir {
    root: PathBuf,
}

impl SourceDir {
    /// Open a source directory. The path is canonicalized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = path
            .canonicalize()
            .map_err(|_| CiError::SourceNotFound(path.to_path_buf()))?;

        if !root.is_dir() {
            return Err(CiError::SourceNotFound(root));
        }

        Ok(Self { root })
    }

    /// Root of the tree on the host
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path relative to the root.
    ///
    /// Absolute paths, `..` components and symlinks leading out of the
    /// tree are rejected.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        if relative.is_empty() {
            return Err(CiError::InvalidPath("empty path".to_string()));
        }

        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(CiError::InvalidPath(format!(
                        "{} escapes the source directory",
                        relative
                    )))
                }
            }
        }

        let joined = self.root.join(rel);
        match joined.canonicalize() {
            Ok(real) if real.starts_with(&self.root) => Ok(real),
            Ok(_) => Err(CiError::InvalidPath(format!(
                "{} links outside the source directory",
                relative
            ))),
            // Nothing there to follow; reading it fails on its own
            Err(_) => Ok(joined),
        }
    }

    /// Read a file under the tree as text
    pub fn file_contents(&self, relative: &str) -> Result<String> {
        let path = self.resolve(relative)?;
        std::fs::read_to_string(&path).map_err(|source| CiError::FileRead { path, source })
    }

    /// Check whether a file exists under the tree
    pub fn contains(&self, relative: &str) -> bool {
        self.resolve(relative).map(|p| p.exists()).unwrap_or(false)
    }
}
