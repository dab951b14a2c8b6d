//! `[locale]` section configuration.
//!
//! ```toml
//! [locale]
//! enable = true
//! modules = ["modules/cart", "modules/frame"]   # default: every module with a locale/ dir
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ModuleConfig;
use crate::locale::LOCALE_DIR;

/// Language pack watching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub enable: bool,

    /// Module roots whose `locale/` directories are watched.
    pub modules: Vec<PathBuf>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            enable: true,
            modules: Vec::new(),
        }
    }
}

impl LocaleConfig {
    pub(crate) fn normalize(&mut self, root: &Path) {
        self.modules = self
            .modules
            .iter()
            .map(|path| crate::utils::path::normalize_path(&root.join(path)))
            .collect();
    }

    /// Fill an empty list from the modules that ship a `locale/` directory.
    pub(crate) fn derive_from(&mut self, modules: &[ModuleConfig]) {
        if !self.modules.is_empty() {
            return;
        }
        self.modules = modules
            .iter()
            .map(|module| module.path.clone())
            .filter(|path| path.join(LOCALE_DIR).is_dir())
            .collect();
    }
}
