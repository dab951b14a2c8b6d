//! Scenario file loading with explicit cache invalidation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use super::{ScenarioError, ScenarioSet, parse_scenarios};

/// Source of scenario sets, one per file.
///
/// Loads may be served from a cache; `invalidate` forces the next `load` of
/// that path to read it again.
pub trait ScenarioLoader: Send + Sync {
    fn invalidate(&self, path: &Path);

    fn load(&self, path: &Path) -> Result<Arc<ScenarioSet>, ScenarioError>;
}

/// Reads JSON scenario files, caching parsed sets by path.
#[derive(Debug, Default)]
pub struct JsonScenarioLoader {
    cache: DashMap<PathBuf, Arc<ScenarioSet>>,
}

impl JsonScenarioLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScenarioLoader for JsonScenarioLoader {
    fn invalidate(&self, path: &Path) {
        self.cache.remove(path);
    }

    fn load(&self, path: &Path) -> Result<Arc<ScenarioSet>, ScenarioError> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(Arc::clone(cached.value()));
        }

        let bytes = fs::read(path).map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;
        let set = Arc::new(
            parse_scenarios(&bytes).map_err(|e| ScenarioError::Json(path.to_path_buf(), e))?,
        );
        self.cache.insert(path.to_path_buf(), Arc::clone(&set));
        Ok(set)
    }
}

/// Load and merge every file, left to right.
///
/// A key defined again by a later file is overridden in place. Files that no
/// longer exist are skipped; any other failure aborts the whole load.
pub fn load_scenarios(
    loader: &dyn ScenarioLoader,
    paths: &[PathBuf],
) -> Result<ScenarioSet, ScenarioError> {
    let mut merged = ScenarioSet::default();
    for path in paths {
        let set = match loader.load(path) {
            Ok(set) => set,
            Err(ScenarioError::Io(_, e)) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        merged.extend(set.iter().map(|(key, mocks)| (key.clone(), mocks.clone())));
    }
    Ok(merged)
}
