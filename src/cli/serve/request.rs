//! Request URL to path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::core::paths::public_url;
use crate::utils::path::join_within;

/// Decoded request path without query string or fragment.
///
/// Always starts with `/`.
pub fn request_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_string());

    if decoded.starts_with('/') {
        decoded
    } else {
        format!("/{decoded}")
    }
}

/// Whether `path` is under the public static prefix (`/static/...`).
pub fn is_static_request(path: &str) -> bool {
    let prefix = public_url();
    path.strip_prefix(&prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Resolve a `/static/...` request to an existing file in the static directory.
pub fn resolve_static_file(path: &str, static_dir: &Path) -> Option<PathBuf> {
    let rest = path.strip_prefix(&public_url())?;
    join_within(static_dir, rest).filter(|file| file.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/users?id=1"), "/users");
        assert_eq!(request_path("/a%20b.js#x"), "/a b.js");
        assert_eq!(request_path("relative"), "/relative");
        assert_eq!(request_path(""), "/");
    }

    #[test]
    fn test_is_static_request() {
        assert!(is_static_request("/static/modules/a/a.js"));
        assert!(is_static_request("/static"));
        assert!(!is_static_request("/staticky/a.js"));
        assert!(!is_static_request("/users"));
    }

    #[test]
    fn test_resolve_static_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("vendors")).unwrap();
        std::fs::write(dir.path().join("vendors/react.js"), "").unwrap();

        assert_eq!(
            resolve_static_file("/static/vendors/react.js", dir.path()),
            Some(dir.path().join("vendors/react.js"))
        );
        assert_eq!(resolve_static_file("/static/vendors", dir.path()), None);
        assert_eq!(resolve_static_file("/static/../secret", dir.path()), None);
        assert_eq!(resolve_static_file("/other/react.js", dir.path()), None);
    }
}
