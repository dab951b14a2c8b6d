use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use rustc_hash::FxBuildHasher;

use super::types::ChangeKind;
use crate::logger::Logger;
use crate::utils::path::normalize_path;

/// Quiet period before a burst of writes is released.
///
/// Stands in for the watcher's await-write-finish buffering: events on the
/// same path inside the window collapse into one, so a handler runs once per
/// settled file rather than once per partial write.
pub(super) const DEBOUNCE_MS: u64 = 300;

pub(super) type Changes = IndexMap<PathBuf, ChangeKind, FxBuildHasher>;

/// Pure debouncer: only handles timing and event deduplication.
///
/// Paths keep the order in which they were first seen so per-path ordering
/// of the underlying watcher is preserved downstream.
pub(super) struct Debouncer {
    pub(super) changes: Changes,
    pub(super) last_event: Option<Instant>,
    logger: Logger,
}

impl Debouncer {
    pub(super) fn new(logger: Logger) -> Self {
        Self {
            changes: Changes::default(),
            last_event: None,
            logger,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → nothing (appeared then vanished)
    /// - Same type events: first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        match event.kind {
            EventKind::Create(_) => self.add_paths(&event.paths, ChangeKind::Created),
            EventKind::Remove(_) => self.add_paths(&event.paths, ChangeKind::Removed),
            EventKind::Modify(ModifyKind::Metadata(_)) => {}
            EventKind::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
                (RenameMode::From, paths) => self.add_paths(paths, ChangeKind::Removed),
                (RenameMode::To, paths) => self.add_paths(paths, ChangeKind::Created),
                (RenameMode::Both, [from, to, ..]) => {
                    self.add_paths(std::slice::from_ref(from), ChangeKind::Removed);
                    self.add_paths(std::slice::from_ref(to), ChangeKind::Created);
                }
                // Direction unknown: existence check in the classifier settles it
                (_, paths) => self.add_paths(paths, ChangeKind::Modified),
            },
            EventKind::Modify(_) => self.add_paths(&event.paths, ChangeKind::Modified),
            _ => {}
        }
    }

    fn add_paths(&mut self, paths: &[PathBuf], kind: ChangeKind) {
        let logger = &self.logger;

        for path in paths {
            if is_temp_file(path) {
                continue;
            }

            let path = normalize_path(path);

            if let Some(&existing) = self.changes.get(&path) {
                match (existing, kind) {
                    (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                        crate::debug!(logger, "watch"; "restore {}->{}: {}", existing.label(), kind.label(), path.display());
                        self.changes.insert(path, kind);
                    }
                    (ChangeKind::Modified, ChangeKind::Removed) => {
                        crate::debug!(logger, "watch"; "upgrade modified->removed: {}", path.display());
                        self.changes.insert(path, ChangeKind::Removed);
                    }
                    (ChangeKind::Created, ChangeKind::Removed) => {
                        crate::debug!(logger, "watch"; "discard created+removed: {}", path.display());
                        self.changes.shift_remove(&path);
                    }
                    _ => continue,
                }
                self.last_event = Some(Instant::now());
                continue;
            }

            crate::debug!(logger, "watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            self.last_event = Some(Instant::now());
        }
    }

    /// Take raw events once the quiet period has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<Changes> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;

        (!changes.is_empty()).then_some(changes)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        last_event.elapsed() >= Duration::from_millis(DEBOUNCE_MS) && !self.changes.is_empty()
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(crate) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
