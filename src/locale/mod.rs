//! Language pack loader and watcher.
//!
//! Loads every module's `locale/` directory into the build output store once
//! the watcher is ready, then keeps each locale bundle in sync with its source
//! and tells connected browsers about the change.
//!
//! ```text
//! idle --Ready--> loading --> watching --add/change/remove--> handling --> watching
//! ```

mod pack;


pub use pack::{
    COPY_FILE, LINKS_FILE, LOCALE_DIR, add_language_packs_for_module, add_module_language_pack,
    extract_language_data, load_module_language_packs, module_root, normalize_locale,
    parse_path_info, remove_module_language_pack,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::actor::fs::{FsActor, WatchEvent, WatchRoot, WatchStream};
use crate::core::Paths;
use crate::logger::Logger;
use crate::reload::Publisher;
use crate::reload::message::{PublishAction, PublishMessage};
use crate::store::{BuildOutputStore, StoreError};

const SCOPE: &str = "locale";

#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("not a path inside a module locale directory: `{0}`")]
    MalformedPath(PathBuf),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid language pack JSON in `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which modules to watch.
#[derive(Debug, Clone, Default)]
pub struct LocaleOptions {
    pub enabled: bool,
    /// Module source roots; each is expected to hold a `locale/` directory.
    pub module_paths: Vec<PathBuf>,
}

/// Collaborators shared with the rest of the server.
#[derive(Clone)]
pub struct LocaleDeps {
    pub store: Arc<dyn BuildOutputStore>,
    pub paths: Paths,
    pub publisher: Publisher,
    pub logger: Logger,
}

// ============================================================================
// Actor
// ============================================================================

/// Consumes one watch stream over every module's `locale/` directory.
pub struct LocaleActor {
    stream: WatchStream,
    module_paths: Vec<PathBuf>,
    deps: LocaleDeps,
    ready: watch::Sender<bool>,
}

impl LocaleActor {
    pub fn new(
        stream: WatchStream,
        module_paths: Vec<PathBuf>,
        deps: LocaleDeps,
    ) -> (Self, watch::Receiver<bool>) {
        let (ready, ready_rx) = watch::channel(false);
        let actor = Self {
            stream,
            module_paths,
            deps,
            ready,
        };
        (actor, ready_rx)
    }

    /// Run until the watch stream closes.
    pub async fn run(mut self) {
        while let Some(event) = self.stream.recv().await {
            match event {
                WatchEvent::Ready => {
                    self.load_all();
                    let _ = self.ready.send(true);
                }
                WatchEvent::Error(e) => {
                    crate::warn!(self.deps.logger, SCOPE; "Language pack watcher error: {}", e);
                }
                event => {
                    if let Err(e) = self.handle(&event) {
                        crate::error!(self.deps.logger, SCOPE; "{}", e);
                    }
                }
            }
        }
    }

    /// Bulk load every module, then announce the watch once.
    fn load_all(&self) {
        let LocaleDeps {
            store,
            paths,
            logger,
            ..
        } = &self.deps;

        let mut names = Vec::with_capacity(self.module_paths.len());
        for module_path in &self.module_paths {
            let name = module_name(module_path);
            match add_language_packs_for_module(store.as_ref(), paths, module_path, &name) {
                Ok(locales) => {
                    crate::log!(logger, SCOPE; "loaded lang packs for {}: {}", name, locales.join(", "));
                }
                Err(e) => crate::error!(logger, SCOPE; "{}", e),
            }
            names.push(name);
        }

        crate::log!(logger, SCOPE; "Watching language packs for {}", names.join(", "));
    }

    /// Re-project one locale entry and publish the change.
    ///
    /// The publish goes out even when the store update fails; the failure is
    /// returned afterwards.
    fn handle(&self, event: &WatchEvent) -> Result<(), LocaleError> {
        let (Some(path), Some(action)) = (event.path(), PublishAction::locale(event)) else {
            return Ok(());
        };
        let (module_name, locale) = parse_path_info(path)?;
        let logger = &self.deps.logger;

        let verb = match action {
            PublishAction::LocaleAdd => "added",
            PublishAction::LocaleRemove => "removed",
            _ => "changed",
        };
        crate::log!(logger, SCOPE; "\"{}\" for module \"{}\" has been {}", locale, module_name, verb);

        let result = self.project(path, action, &module_name, &locale);

        self.deps.publisher.publish(PublishMessage {
            action,
            path: path.to_string_lossy().into_owned(),
            module_name,
            locale: Some(locale),
        });

        result
    }

    fn project(
        &self,
        path: &Path,
        action: PublishAction,
        module_name: &str,
        locale: &str,
    ) -> Result<(), LocaleError> {
        let LocaleDeps { store, paths, .. } = &self.deps;
        let entry = locale_entry(path).ok_or_else(|| LocaleError::MalformedPath(path.to_path_buf()))?;

        // A file removed from a directory locale leaves the entry in place
        if action == PublishAction::LocaleRemove && !entry.exists() {
            return remove_module_language_pack(store.as_ref(), paths, module_name, locale);
        }
        add_module_language_pack(store.as_ref(), paths, &entry, module_name, locale)
    }
}

/// `<module>/locale/<entry>` for any path at or below that entry.
fn locale_entry(path: &Path) -> Option<PathBuf> {
    let dir = module_root(path)?.join(LOCALE_DIR);
    let first = path.strip_prefix(&dir).ok()?.components().next()?;
    Some(dir.join(first))
}

fn module_name(module_path: &Path) -> String {
    module_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Startup
// ============================================================================

/// Running language pack watcher.
pub struct LocaleWatcher {
    ready: watch::Receiver<bool>,
}

impl LocaleWatcher {
    /// Wait until the initial bulk load has been written to the store.
    pub async fn ready(&mut self) {
        let _ = self.ready.wait_for(|ready| *ready).await;
    }
}

/// Start the language pack watcher when enabled and there is anything to watch.
pub async fn load_language_packs(
    options: &LocaleOptions,
    deps: LocaleDeps,
) -> anyhow::Result<Option<LocaleWatcher>> {
    let logger = deps.logger.clone();
    crate::debug!(logger, SCOPE; "\"use_language_packs\" was set to \"{}\"", options.enabled);

    if !options.enabled || options.module_paths.is_empty() {
        crate::debug!(logger, SCOPE; "Locale folders were not found");
        return Ok(None);
    }

    crate::debug!(logger, SCOPE; "Loading language packs {:?}", options.module_paths);
    let watcher = logger
        .time(SCOPE, "locale - initializing", async {
            let roots = options
                .module_paths
                .iter()
                .map(|path| WatchRoot::recursive(path.join(LOCALE_DIR)))
                .collect();
            let stream = FsActor::spawn(roots, None, logger.clone())?;
            let (actor, ready) = LocaleActor::new(stream, options.module_paths.clone(), deps);
            tokio::spawn(actor.run());
            anyhow::Ok(LocaleWatcher { ready })
        })
        .await?;

    Ok(Some(watcher))
}
