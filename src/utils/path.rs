//! Filesystem path helpers.

use std::path::{Component, Path, PathBuf};

/// Normalize a path to absolute form.
///
/// Canonicalizes when the path exists, otherwise joins a relative path
/// onto the current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Canonical form of a file that may not exist yet: canonical parent + file name.
pub fn normalize_file(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => normalize_path(parent).join(name),
        _ => normalize_path(path),
    }
}

/// Join a request path under `root`, refusing anything that climbs out of it.
///
/// Leading slashes are ignored, so `/a/b.js` resolves to `root/a/b.js`.
pub fn join_within(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut joined = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(joined)
}
