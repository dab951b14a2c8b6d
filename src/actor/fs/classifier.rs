use std::path::PathBuf;

use rustc_hash::FxHashSet;

use super::debouncer::Changes;
use super::types::ChangeKind;
use crate::logger::Logger;

/// Turns raw debounced changes into actionable ones.
///
/// Pipeline: correct_by_existence → filter_actionable → filter_selected
pub(super) struct EventClassifier<'a> {
    /// When set, only these exact files are reported.
    pub(super) only: Option<&'a FxHashSet<PathBuf>>,
    pub(super) logger: &'a Logger,
}

impl EventClassifier<'_> {
    pub(super) fn classify(&self, raw: Changes) -> Vec<(PathBuf, ChangeKind)> {
        let mut changes = raw;

        self.correct_by_existence(&mut changes);
        Self::filter_actionable(&mut changes);
        self.filter_selected(&mut changes);

        changes.into_iter().collect()
    }

    /// Reconcile event kinds with actual filesystem state.
    ///
    /// The watcher may report stale events (e.g., Created for a file that's already
    /// been deleted, or Removed for a file that still exists after an atomic save).
    fn correct_by_existence(&self, changes: &mut Changes) {
        let logger = self.logger;
        changes.retain(|path, kind| {
            let exists = path.exists();
            match *kind {
                ChangeKind::Created if !exists => {
                    crate::debug!(logger, "watch"; "discard created (gone): {}", path.display());
                    return false;
                }
                ChangeKind::Modified if !exists => {
                    crate::debug!(logger, "watch"; "upgrade modified->removed: {}", path.display());
                    *kind = ChangeKind::Removed;
                }
                ChangeKind::Removed if exists => {
                    crate::debug!(logger, "watch"; "downgrade removed->modified: {}", path.display());
                    *kind = ChangeKind::Modified;
                }
                _ => {}
            }
            true
        });
    }

    /// Created/Modified must be a file; directory events carry no content.
    pub(super) fn filter_actionable(changes: &mut Changes) {
        changes.retain(|path, kind| match kind {
            ChangeKind::Created | ChangeKind::Modified => path.is_file(),
            ChangeKind::Removed => true,
        });
    }

    fn filter_selected(&self, changes: &mut Changes) {
        if let Some(only) = self.only {
            changes.retain(|path, _| only.contains(path));
        }
    }
}
