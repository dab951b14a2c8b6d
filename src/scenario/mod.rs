//! Mock scenario hot-reloading.
//!
//! Each module may ship `mock/scenarios.json`. All files are merged into one
//! scenario set and served through a [`ScenarioRouter`]; when any file changes
//! the whole set is re-read and the router's middleware stack is replaced.

mod loader;
mod router;

pub use loader::{JsonScenarioLoader, ScenarioLoader, load_scenarios};
pub use router::{MockMiddleware, MockRequest, MockResponse, ParrotMiddleware, ScenarioRouter};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::actor::fs::{FsActor, WatchEvent, WatchRoot, WatchStream};
use crate::core::paths::join_url_fragments;
use crate::logger::Logger;
use crate::reload::Publisher;
use crate::reload::message::{PublishAction, PublishMessage};
use crate::utils::path::normalize_file;

const SCOPE: &str = "parrot";

/// Directory holding a module's scenario file.
pub const MOCK_DIR: &str = "mock";
pub const SCENARIOS_FILE: &str = "scenarios.json";

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid scenario file `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),
}

// ============================================================================
// Scenario definitions
// ============================================================================

/// Scenario key -> mocks, in file order.
pub type ScenarioSet = IndexMap<String, Vec<MockDefinition>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockDefinition {
    pub request: MockRequestSpec,
    #[serde(default)]
    pub response: MockResponseSpec,
}

/// `"/path"` or `{ "path": "/path", "method": "POST" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MockRequestSpec {
    Path(String),
    Detailed {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
    },
}

impl MockRequestSpec {
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Detailed { path, .. } => path,
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { method, .. } => method.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockResponseSpec {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl Default for MockResponseSpec {
    fn default() -> Self {
        Self {
            status: default_status(),
            body: serde_json::Value::Null,
        }
    }
}

const fn default_status() -> u16 {
    200
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(MockDefinition),
    Many(Vec<MockDefinition>),
}

/// Parse one scenario file: `key -> definition | [definition]`.
pub fn parse_scenarios(bytes: &[u8]) -> Result<ScenarioSet, serde_json::Error> {
    let raw: IndexMap<String, OneOrMany> = serde_json::from_slice(bytes)?;
    Ok(raw
        .into_iter()
        .map(|(key, mocks)| {
            let mocks = match mocks {
                OneOrMany::One(mock) => vec![mock],
                OneOrMany::Many(mocks) => mocks,
            };
            (key, mocks)
        })
        .collect())
}

/// Module owning a scenario file: `<module>/mock/scenarios.json` -> `module`.
pub fn module_name_from_path(path: &Path) -> String {
    path.ancestors()
        .find(|dir| dir.file_name().is_some_and(|name| name == MOCK_DIR))
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Actor
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ScenarioOptions {
    pub enabled: bool,
    pub files: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct ScenarioDeps {
    pub loader: Arc<dyn ScenarioLoader>,
    pub publisher: Publisher,
    pub logger: Logger,
    /// Base for the route URLs printed after each load.
    pub server_address: String,
}

/// Reloads scenarios and resets the router on every watched change.
pub struct ScenarioActor {
    stream: WatchStream,
    files: Vec<PathBuf>,
    router: Arc<ScenarioRouter>,
    deps: ScenarioDeps,
    ready: watch::Sender<bool>,
}

impl ScenarioActor {
    pub fn new(
        stream: WatchStream,
        files: Vec<PathBuf>,
        router: Arc<ScenarioRouter>,
        deps: ScenarioDeps,
    ) -> (Self, watch::Receiver<bool>) {
        let (ready, ready_rx) = watch::channel(false);
        let actor = Self {
            stream,
            files,
            router,
            deps,
            ready,
        };
        (actor, ready_rx)
    }

    pub async fn run(mut self) {
        while let Some(event) = self.stream.recv().await {
            match event {
                WatchEvent::Ready => {
                    crate::log!(self.deps.logger, SCOPE; "Watching scenarios");
                    if let Err(e) = self.import() {
                        crate::error!(self.deps.logger, SCOPE; "{}", e);
                    }
                    let _ = self.ready.send(true);
                }
                WatchEvent::Error(e) => {
                    crate::warn!(self.deps.logger, SCOPE; "Watch error: {}", e);
                }
                event => {
                    if let Err(e) = self.handle(&event) {
                        crate::error!(self.deps.logger, SCOPE; "{}", e);
                    }
                }
            }
        }
    }

    /// Reload, then publish. Nothing is published when the reload fails.
    fn handle(&self, event: &WatchEvent) -> Result<(), ScenarioError> {
        let (Some(path), Some(action)) = (event.path(), PublishAction::parrot(event)) else {
            return Ok(());
        };
        let module_name = module_name_from_path(path);

        let verb = match action {
            PublishAction::ParrotAdd => "added",
            PublishAction::ParrotRemove => "removed",
            _ => "changed",
        };
        crate::log!(self.deps.logger, SCOPE; "Scenarios for \"{}\" has been {}", module_name, verb);

        self.deps.loader.invalidate(path);
        self.import()?;

        self.deps.publisher.publish(PublishMessage {
            action,
            path: path.to_string_lossy().into_owned(),
            module_name,
            locale: None,
        });
        Ok(())
    }

    /// Load every file and swap the router's stack.
    fn import(&self) -> Result<(), ScenarioError> {
        let scenarios = load_scenarios(self.deps.loader.as_ref(), &self.files)?;
        self.router.reset(&scenarios);

        let routes = scenarios
            .iter()
            .map(|(key, mocks)| {
                let request = mocks.first().map(|m| m.request.path()).unwrap_or_default();
                format!(
                    "\t\"{}\" - \"{}\"",
                    key,
                    join_url_fragments(&[&self.deps.server_address, request])
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");
        crate::info!(self.deps.logger, SCOPE; "Scenario routes registered: [\n{}\n  ]", routes);
        Ok(())
    }
}

// ============================================================================
// Startup
// ============================================================================

/// Running scenario watcher and the router it feeds.
pub struct ScenarioWatcher {
    pub router: Arc<ScenarioRouter>,
    ready: watch::Receiver<bool>,
}

impl ScenarioWatcher {
    /// Wait until the first import has populated the router.
    pub async fn ready(&mut self) {
        let _ = self.ready.wait_for(|ready| *ready).await;
    }
}

/// Start the scenario watcher when enabled and any scenario file is configured.
pub async fn load_parrot_middleware(
    options: &ScenarioOptions,
    deps: ScenarioDeps,
) -> anyhow::Result<Option<ScenarioWatcher>> {
    let logger = deps.logger.clone();
    crate::debug!(logger, SCOPE; "\"use_parrot_middleware\" was set to \"{}\"", options.enabled);

    if !options.enabled || options.files.is_empty() {
        crate::debug!(logger, SCOPE; "Scenarios were not found");
        return Ok(None);
    }

    crate::debug!(logger, SCOPE; "Loading scenarios {:?}", options.files);
    let watcher = logger
        .time(SCOPE, "Initializing Parrot scenarios", async {
            // Watch each file through its directory so a removed file can come back
            let files: Vec<PathBuf> = options.files.iter().map(|f| normalize_file(f)).collect();
            let roots = files
                .iter()
                .filter_map(|file| file.parent())
                .map(WatchRoot::shallow)
                .collect();
            let stream = FsActor::spawn(roots, Some(files.clone()), logger.clone())?;

            let router = Arc::new(ScenarioRouter::new());
            let (actor, ready) = ScenarioActor::new(stream, files, Arc::clone(&router), deps);
            tokio::spawn(actor.run());
            anyhow::Ok(ScenarioWatcher { router, ready })
        })
        .await?;

    Ok(Some(watcher))
}
