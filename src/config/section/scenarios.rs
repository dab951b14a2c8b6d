//! `[scenarios]` section configuration.
//!
//! ```toml
//! [scenarios]
//! enable = true
//! files = ["modules/cart/mock/scenarios.json"]  # default: every module's mock/scenarios.json
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ModuleConfig;
use crate::scenario::{MOCK_DIR, SCENARIOS_FILE};

/// Mock scenario watching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenariosConfig {
    pub enable: bool,

    /// Scenario files, merged in order.
    pub files: Vec<PathBuf>,
}

impl Default for ScenariosConfig {
    fn default() -> Self {
        Self {
            enable: true,
            files: Vec::new(),
        }
    }
}

impl ScenariosConfig {
    pub(crate) fn normalize(&mut self, root: &Path) {
        self.files = self
            .files
            .iter()
            .map(|file| crate::utils::path::normalize_file(&root.join(file)))
            .collect();
    }

    /// Fill an empty list with the modules' existing `mock/scenarios.json` files.
    pub(crate) fn derive_from(&mut self, modules: &[ModuleConfig]) {
        if !self.files.is_empty() {
            return;
        }
        self.files = modules
            .iter()
            .map(|module| module.path.join(MOCK_DIR).join(SCENARIOS_FILE))
            .filter(|file| file.is_file())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_scenarios_config() {
        let config = test_parse_config("[scenarios]\nenable = false\nfiles = [\"a.json\", \"b.json\"]");
        assert!(!config.scenarios.enable);
        assert_eq!(
            config.scenarios.files,
            vec![PathBuf::from("a.json"), PathBuf::from("b.json")]
        );
    }

    #[test]
    fn test_derive_existing_files_only() {
        let dir = TempDir::new().unwrap();
        let mocked = dir.path().join("mocked");
        let plain = dir.path().join("plain");
        std::fs::create_dir_all(mocked.join(MOCK_DIR)).unwrap();
        std::fs::write(mocked.join(MOCK_DIR).join(SCENARIOS_FILE), "{}").unwrap();
        std::fs::create_dir_all(plain.join(MOCK_DIR)).unwrap();

        let mut config = ScenariosConfig::default();
        config.derive_from(&[ModuleConfig::at(&plain), ModuleConfig::at(&mocked)]);

        assert_eq!(
            config.files,
            vec![mocked.join(MOCK_DIR).join(SCENARIOS_FILE)]
        );
    }
}
