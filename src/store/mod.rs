//! Build output store.
//!
//! In-memory stand-in for the bundler's output directory. The build service
//! owns the store; the locale watcher, the proxy relay and the build mirror
//! write through it, and the HTTP server reads from it.
//!
//! Keys are absolute filesystem paths under the project root
//! (`<root>/static/modules/<name>/...`) so a request URL maps onto a key with
//! [`Paths::context_path`](crate::core::Paths::context_path).
//!
//! Writing a file implicitly creates its parent directories (`mkdir -p`),
//! directories are only removed explicitly and only when empty.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store keys must be absolute: `{0}`")]
    NotAbsolute(PathBuf),

    #[error("no such file in build output: `{0}`")]
    NotFound(PathBuf),
}

/// Read/write access to generated build artifacts.
pub trait BuildOutputStore: Send + Sync {
    fn read(&self, path: &Path) -> Option<Arc<[u8]>>;

    fn write(&self, path: &Path, contents: Vec<u8>) -> Result<(), StoreError>;

    fn remove(&self, path: &Path) -> Result<(), StoreError>;

    /// True for a stored file or a directory created by a write.
    fn exists(&self, path: &Path) -> bool;

    /// Remove `dir` if nothing is stored beneath it. Returns whether it was removed.
    fn remove_dir_if_empty(&self, dir: &Path) -> bool;
}

/// `RwLock`-guarded map store.
///
/// Every write completes under the lock before a subsequent read observes it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<PathBuf, Arc<[u8]>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn check(path: &Path) -> Result<(), StoreError> {
        if path.is_absolute() {
            Ok(())
        } else {
            Err(StoreError::NotAbsolute(path.to_path_buf()))
        }
    }
}

impl BuildOutputStore for MemoryStore {
    fn read(&self, path: &Path) -> Option<Arc<[u8]>> {
        self.files.read().get(path).cloned()
    }

    fn write(&self, path: &Path, contents: Vec<u8>) -> Result<(), StoreError> {
        Self::check(path)?;

        {
            let mut dirs = self.dirs.write();
            let mut parent = path.parent();
            while let Some(dir) = parent {
                if !dirs.insert(dir.to_path_buf()) {
                    break;
                }
                parent = dir.parent();
            }
        }

        self.files
            .write()
            .insert(path.to_path_buf(), Arc::from(contents));
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), StoreError> {
        match self.files.write().remove(path) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(path.to_path_buf())),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path) || self.dirs.read().contains(path)
    }

    fn remove_dir_if_empty(&self, dir: &Path) -> bool {
        let files = self.files.read();
        let mut dirs = self.dirs.write();

        if !dirs.contains(dir) {
            return false;
        }

        let has_children = files.keys().any(|p| p != dir && p.starts_with(dir))
            || dirs.iter().any(|d| d != dir && d.starts_with(dir));
        if has_children {
            return false;
        }

        dirs.remove(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        let path = Path::new("/p/static/modules/a/en-us/a.json");

        store.write(path, b"{}".to_vec()).unwrap();

        assert_eq!(store.read(path).as_deref(), Some(&b"{}"[..]));
        assert!(store.exists(path));
        assert!(store.exists(Path::new("/p/static/modules/a/en-us")));
        assert!(store.exists(Path::new("/p/static/modules")));
    }

    #[test]
    fn test_relative_key_rejected() {
        let store = MemoryStore::new();
        let err = store.write(Path::new("static/a.js"), Vec::new());
        assert!(matches!(err, Err(StoreError::NotAbsolute(_))));
    }

    #[test]
    fn test_remove_missing_is_error() {
        let store = MemoryStore::new();
        let err = store.remove(Path::new("/p/nope.json"));
        assert!(matches!(err, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_remove_dir_only_when_empty() {
        let store = MemoryStore::new();
        let dir = Path::new("/p/static/modules/a/en-us");
        store.write(&dir.join("a.json"), b"{}".to_vec()).unwrap();
        store.write(&dir.join("extra.json"), b"{}".to_vec()).unwrap();

        store.remove(&dir.join("a.json")).unwrap();
        assert!(!store.remove_dir_if_empty(dir));

        store.remove(&dir.join("extra.json")).unwrap();
        assert!(store.remove_dir_if_empty(dir));
        assert!(!store.exists(dir));
        // Parent is untouched
        assert!(store.exists(Path::new("/p/static/modules/a")));
    }
}
