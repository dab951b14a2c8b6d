use std::path::{Path, PathBuf};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    pub(super) fn into_event(self, path: PathBuf) -> WatchEvent {
        match self {
            Self::Created => WatchEvent::Add(path),
            Self::Modified => WatchEvent::Change(path),
            Self::Removed => WatchEvent::Remove(path),
        }
    }
}

/// Typed file-watch event.
///
/// `Ready` is delivered exactly once, before any path event, after every
/// existing root has been attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Ready,
    Add(PathBuf),
    Change(PathBuf),
    Remove(PathBuf),
    Error(String),
}

impl WatchEvent {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Add(p) | Self::Change(p) | Self::Remove(p) => Some(p),
            Self::Ready | Self::Error(_) => None,
        }
    }
}
