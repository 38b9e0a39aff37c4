//! Path jail for filesystem tools
//!
//! Every path a tool touches is resolved and verified to stay inside a
//! canonicalized base directory. Symlinks and `..` components are resolved
//! before the containment check, so a path that escapes after resolution is
//! rejected even if it looks relative.

use crate::errors::{EngineError, Result};
use std::path::{Path, PathBuf};

/// Jail rooted at a canonicalized base directory
#[derive(Debug, Clone)]
pub struct PathJail {
    root: PathBuf,
}

impl PathJail {
    /// Create a jail; the root must exist
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();

        if !root.exists() {
            return Err(EngineError::Config(format!(
                "jail root does not exist: {}",
                root.display()
            )));
        }

        let root = root.canonicalize().map_err(|e| {
            EngineError::Config(format!("failed to canonicalize jail root: {}", e))
        })?;

        Ok(Self { root })
    }

    /// Jail root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path (absolute or jail-relative) and verify containment.
    ///
    /// The target must exist; resolution follows symlinks before checking.
    pub fn verify(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = full.canonicalize().map_err(|_| {
            EngineError::Other(format!("cannot resolve path: {}", path.display()))
        })?;

        if !canonical.starts_with(&self.root) {
            return Err(EngineError::Other(format!(
                "path escapes the allowed directory: {}",
                path.display()
            )));
        }

        Ok(canonical)
    }

    /// Containment check without requiring the path to exist: resolves the
    /// deepest existing ancestor and verifies it stays inside the jail.
    pub fn would_contain(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let mut probe = full.as_path();
        loop {
            if let Ok(canonical) = probe.canonicalize() {
                return canonical.starts_with(&self.root);
            }
            match probe.parent() {
                Some(parent) => probe = parent,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_verify_inside_jail() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("file.txt"), "x").unwrap();

        let jail = PathJail::new(tmp.path()).unwrap();
        let verified = jail.verify("file.txt").unwrap();
        assert!(verified.ends_with("file.txt"));
    }

    #[test]
    fn test_traversal_rejected() {
        let tmp = TempDir::new().unwrap();
        let jail = PathJail::new(tmp.path()).unwrap();

        assert!(jail.verify("../../../etc/passwd").is_err());
    }

    #[test]
    fn test_absolute_outside_rejected() {
        let tmp = TempDir::new().unwrap();
        let jail = PathJail::new(tmp.path()).unwrap();

        // /etc exists but is outside the jail
        assert!(jail.verify("/etc").is_err());
    }

    #[test]
    fn test_missing_root_rejected() {
        assert!(PathJail::new("/nonexistent/jail/root").is_err());
    }

    #[test]
    fn test_would_contain() {
        let tmp = TempDir::new().unwrap();
        let jail = PathJail::new(tmp.path()).unwrap();

        assert!(jail.would_contain("new_subdir/new_file.txt"));
        assert!(!jail.would_contain("../outside.txt"));
    }
}
