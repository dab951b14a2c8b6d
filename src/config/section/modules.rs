//! `[[modules]]` entries.
//!
//! ```toml
//! [[modules]]
//! path = "modules/frame"        # name defaults to the directory name
//!
//! [[modules]]
//! name = "cart"
//! path = "modules/cart-module"
//! output = "dist"               # bundler output, relative to path (default "build")
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::module_map::ModuleDescriptor;

const DEFAULT_OUTPUT: &str = "build";

/// One locally built module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl ModuleConfig {
    #[cfg(test)]
    pub fn at(path: &Path) -> Self {
        Self {
            name: None,
            path: path.to_path_buf(),
            output: None,
        }
    }

    /// Configured name, or the directory name of `path`.
    pub fn module_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.path = crate::utils::path::normalize_path(&root.join(&self.path));
    }

    pub fn descriptor(&self) -> ModuleDescriptor {
        let output = self.output.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT));
        ModuleDescriptor {
            name: self.module_name(),
            output: self.path.join(output),
            path: self.path.clone(),
        }
    }
}

/// Problems with the module list as a whole.
pub fn validate_modules(modules: &[ModuleConfig], errors: &mut Vec<String>) {
    let mut seen = rustc_hash::FxHashSet::default();
    for module in modules {
        let name = module.module_name();
        if name.is_empty() {
            errors.push(format!(
                "[[modules]] entry `{}` has no name",
                module.path.display()
            ));
        } else if !seen.insert(name.clone()) {
            errors.push(format!("[[modules]] name `{name}` is used twice"));
        }
        if !module.path.is_dir() {
            errors.push(format!(
                "[[modules]] path `{}` is not a directory",
                module.path.display()
            ));
        }
    }
}
