//! Project path and public URL resolution.
//!
//! All filesystem locations are derived from one project root; all public URLs
//! are derived from the same fixed directory names so that a path written to the
//! build output store and the URL a browser requests always line up:
//!
//! ```text
//! <root>/static/modules/<name>/<name>.js   <->   /static/modules/<name>/<name>.js
//! <root>/static/app/app.js                 <->   /static/app/app.js
//! <root>/static/vendors/<file>.js          <->   /static/vendors/<file>.js
//! ```

use std::path::{Path, PathBuf};

pub const STATIC_DIR: &str = "static";
pub const MODULES_DIR: &str = "modules";
pub const APP_DIR: &str = "app";
pub const EXTERNAL_DIR: &str = "vendors";
pub const TEMP_DIR: &str = ".temp";

/// Path resolver anchored at the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolver anchored at the current working directory.
    pub fn from_cwd() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/rel`, ignoring any leading `/` in `rel`.
    ///
    /// An empty `rel` yields the root itself.
    pub fn context_path(&self, rel: &str) -> PathBuf {
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() {
            return self.root.clone();
        }
        self.root.join(rel)
    }

    pub fn static_path(&self) -> PathBuf {
        self.root.join(STATIC_DIR)
    }

    /// `<static>/modules/<parts...>`
    pub fn modules_path(&self, parts: &[&str]) -> PathBuf {
        join_parts(self.static_path().join(MODULES_DIR), parts)
    }

    pub fn app_path(&self) -> PathBuf {
        self.static_path().join(APP_DIR)
    }

    /// `<static>/vendors/<parts...>`
    pub fn vendors_path(&self, parts: &[&str]) -> PathBuf {
        join_parts(self.static_path().join(EXTERNAL_DIR), parts)
    }

    pub fn temp_path(&self) -> PathBuf {
        self.static_path().join(TEMP_DIR)
    }

    /// Where a module's locale bundle lives in the build output store.
    pub fn locale_bundle_path(&self, module_name: &str, locale: &str) -> PathBuf {
        self.modules_path(&[module_name, locale, &format!("{module_name}.json")])
    }
}

fn join_parts(mut base: PathBuf, parts: &[&str]) -> PathBuf {
    for part in parts {
        let part = part.trim_matches('/');
        if !part.is_empty() {
            base.push(part);
        }
    }
    base
}

// ============================================================================
// URL fragments
// ============================================================================

/// Join URL fragments into an absolute public path.
///
/// Empty fragments are dropped and surrounding slashes trimmed, so the result
/// always has exactly one leading `/` and no doubled separators.
///
/// ```ignore
/// combine_url_fragments(&[]) == "/"
/// combine_url_fragments(&["static/", "/modules"]) == "/static/modules"
/// ```
pub fn combine_url_fragments(parts: &[&str]) -> String {
    format!("/{}", join_url_fragments(parts))
}

/// Same as [`combine_url_fragments`] without the forced leading `/`.
///
/// Used to glue a server address to a request path:
/// `join_url_fragments(&["http://localhost:3001", "/users"])`.
pub fn join_url_fragments(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn public_url() -> String {
    combine_url_fragments(&[STATIC_DIR])
}

/// `/static/modules/<parts...>`
pub fn public_modules_url(parts: &[&str]) -> String {
    let mut all = vec![STATIC_DIR, MODULES_DIR];
    all.extend_from_slice(parts);
    combine_url_fragments(&all)
}

/// `/static/app/<parts...>`
pub fn public_app_url(parts: &[&str]) -> String {
    let mut all = vec![STATIC_DIR, APP_DIR];
    all.extend_from_slice(parts);
    combine_url_fragments(&all)
}

/// `/static/vendors/<parts...>`
pub fn public_externals_url(parts: &[&str]) -> String {
    let mut all = vec![STATIC_DIR, EXTERNAL_DIR];
    all.extend_from_slice(parts);
    combine_url_fragments(&all)
}
