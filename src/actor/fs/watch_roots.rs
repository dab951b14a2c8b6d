use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use crate::logger::Logger;

/// A directory to watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchRoot {
    pub fn recursive(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
        }
    }

    /// Watch only the direct children of `path`.
    pub fn shallow(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
        }
    }

    fn mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }
}

/// Watch-root consistency manager.
///
/// Responsibility:
/// - Attach existing roots at startup
/// - Re-attach roots that were removed and recreated
pub(super) struct WatchRoots {
    desired: Vec<WatchRoot>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(roots: Vec<WatchRoot>) -> Self {
        let mut desired: Vec<WatchRoot> = Vec::with_capacity(roots.len());
        for root in roots {
            if !desired.iter().any(|r| r.path == root.path) {
                desired.push(root);
            }
        }

        Self {
            desired,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for root in &self.desired {
            if !root.path.exists() {
                continue;
            }
            watcher.watch(&root.path, root.mode())?;
            self.attached.insert(root.path.clone());
        }

        Ok(())
    }

    /// Whether some root is still waiting to appear.
    pub(super) fn has_detached(&self) -> bool {
        self.desired.iter().any(|root| !self.attached.contains(&root.path))
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher, logger: &Logger) {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        for root in &self.desired {
            if self.attached.contains(&root.path) || !root.path.exists() {
                continue;
            }

            if watcher.watch(&root.path, root.mode()).is_ok() {
                self.attached.insert(root.path.clone());
                crate::debug!(logger, "watch"; "re-attached watch: {}", root.path.display());
            }
        }
    }
}
