//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Whether `value` parses as an absolute `http(s)` URL.
///
/// ```ignore
/// is_http_url("https://example.com/module-map.json") -> true
/// is_http_url("http://proxy.internal:3128")          -> true
/// is_http_url("ftp://example.com")                   -> false
/// is_http_url("module-map.json")                     -> false
/// ```
pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Find config file by searching upward from current directory
///
/// Returns the absolute path to the config file if found
///
/// ```text
/// /home/user/project/modules/cart/  ← cwd
/// /home/user/project/sandbox.toml   ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

/// Walk up from `start` until `config_name` exists in a directory.
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com/module-map.json"));
        assert!(is_http_url("http://localhost:3128"));
        assert!(!is_http_url("ftp://example.com/module-map.json"));
        assert!(!is_http_url("module-map.json"));
        assert!(!is_http_url(""));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("modules/cart/src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("sandbox.toml"), "").unwrap();

        assert_eq!(
            find_config_file_from(&nested, Path::new("sandbox.toml")),
            Some(dir.path().join("sandbox.toml"))
        );
    }

    #[test]
    fn test_find_config_file_nearest_wins() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("inner");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("sandbox.toml"), "").unwrap();
        std::fs::write(nested.join("sandbox.toml"), "").unwrap();

        assert_eq!(
            find_config_file_from(&nested, Path::new("sandbox.toml")),
            Some(nested.join("sandbox.toml"))
        );
    }

    #[test]
    fn test_find_config_file_missing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            find_config_file_from(dir.path(), Path::new("no-such-config-file.toml")),
            None
        );
    }

    #[test]
    fn test_find_absolute_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_file(&path), None);

        std::fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path), Some(path));
    }
}
