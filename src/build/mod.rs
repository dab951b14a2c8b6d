//! Build-and-watch service.
//!
//! The bundler itself runs outside this process (each module's own `watch`
//! script). [`OutputMirror`] watches every module's output directory and
//! mirrors it into the build output store under
//! `<root>/static/modules/<name>/`, so the HTTP server always serves the
//! latest bundle without touching disk.
//!
//! ```text
//! <module>/build/**  --FsActor-->  OutputMirror  --write-->  store
//!                                       |
//!                                       +--Invalid/Done--> subscribers
//! ```
//!
//! The serve layer subscribes to turn every rebuild into a browser reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jwalk::WalkDir;
use tokio::sync::{broadcast, watch};

use crate::actor::fs::{FsActor, WatchEvent, WatchRoot, WatchStream, is_temp_file};
use crate::core::Paths;
use crate::logger::Logger;
use crate::module_map::ModuleDescriptor;
use crate::store::{BuildOutputStore, StoreError};
use crate::utils::path::normalize_path;

const SCOPE: &str = "build";

/// Buffer for build event subscribers
const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// Output is being rewritten; the store may be stale.
    Invalid,
    /// Output is consistent again.
    Done { elapsed: Duration, files: usize },
}

/// Something that produces module bundles into a [`BuildOutputStore`].
pub trait BuildService: Send + Sync {
    /// The store every other component reads and writes through.
    fn output(&self) -> Arc<dyn BuildOutputStore>;

    /// Events sent after subscribing; earlier ones are not replayed.
    fn subscribe(&self) -> broadcast::Receiver<BuildEvent>;

    /// `true` while the output is consistent.
    fn validity(&self) -> watch::Receiver<bool>;
}

/// Resolve once the service reports valid output.
pub async fn wait_until_valid(service: &dyn BuildService) {
    let mut validity = service.validity();
    let _ = validity.wait_for(|valid| *valid).await;
}

// ============================================================================
// Output mirror
// ============================================================================

/// Mirrors module output directories into the store.
pub struct OutputMirror {
    store: Arc<dyn BuildOutputStore>,
    events: broadcast::Sender<BuildEvent>,
    valid: watch::Sender<bool>,
}

/// One module output directory and where it lands in the store.
#[derive(Debug, Clone)]
struct Mirror {
    source: PathBuf,
    target: PathBuf,
}

impl Mirror {
    fn target_for(&self, file: &Path) -> Option<PathBuf> {
        file.strip_prefix(&self.source)
            .ok()
            .map(|rel| self.target.join(rel))
    }
}

impl OutputMirror {
    /// Start watching every module's output directory.
    ///
    /// The first full mirror happens once the watcher is attached; until then
    /// the service reports invalid output.
    pub fn start(
        modules: &[ModuleDescriptor],
        store: Arc<dyn BuildOutputStore>,
        paths: &Paths,
        logger: Logger,
    ) -> notify::Result<Arc<Self>> {
        let mirrors: Vec<Mirror> = modules
            .iter()
            .map(|module| Mirror {
                source: normalize_path(&module.output),
                target: paths.modules_path(&[&module.name]),
            })
            .collect();

        crate::log!(logger, SCOPE; "initializing build output for {} modules", mirrors.len());
        let roots = mirrors
            .iter()
            .map(|m| WatchRoot::recursive(&m.source))
            .collect();
        let stream = FsActor::spawn(roots, None, logger.clone())?;

        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (valid, _) = watch::channel(false);
        let service = Arc::new(Self {
            store,
            events,
            valid,
        });

        let worker = MirrorWorker {
            service: Arc::clone(&service),
            mirrors,
            logger,
        };
        tokio::spawn(worker.run(stream));

        Ok(service)
    }

    fn invalidate(&self, logger: &Logger) {
        self.valid.send_replace(false);
        let _ = self.events.send(BuildEvent::Invalid);
        crate::warn!(logger, SCOPE; "building...");
    }

    fn done(&self, started: Instant, files: usize, logger: &Logger) {
        let elapsed = started.elapsed();
        crate::log!(logger, SCOPE; "built in {} ms", elapsed.as_millis());
        let _ = self.events.send(BuildEvent::Done { elapsed, files });
        self.valid.send_replace(true);
    }
}

impl BuildService for OutputMirror {
    fn output(&self) -> Arc<dyn BuildOutputStore> {
        Arc::clone(&self.store)
    }

    fn subscribe(&self) -> broadcast::Receiver<BuildEvent> {
        self.events.subscribe()
    }

    fn validity(&self) -> watch::Receiver<bool> {
        self.valid.subscribe()
    }
}

struct MirrorWorker {
    service: Arc<OutputMirror>,
    mirrors: Vec<Mirror>,
    logger: Logger,
}

impl MirrorWorker {
    async fn run(self, mut stream: WatchStream) {
        while let Some(event) = stream.recv().await {
            match event {
                WatchEvent::Ready => {
                    let started = Instant::now();
                    self.service.invalidate(&self.logger);
                    let files = self.mirror_all();
                    self.service.done(started, files, &self.logger);
                }
                WatchEvent::Error(e) => {
                    crate::warn!(self.logger, SCOPE; "output watcher error: {}", e);
                }
                first => {
                    let started = Instant::now();
                    self.service.invalidate(&self.logger);

                    // Take whatever else the same debounce window produced
                    let mut files = self.apply(&first);
                    while let Some(event) = stream.try_recv() {
                        files += self.apply(&event);
                    }

                    self.service.done(started, files, &self.logger);
                }
            }
        }
    }

    /// Copy every output file into the store. Returns the number written.
    fn mirror_all(&self) -> usize {
        let mut written = 0;
        for mirror in &self.mirrors {
            if !mirror.source.is_dir() {
                crate::debug!(self.logger, SCOPE; "no output yet at {}", mirror.source.display());
                continue;
            }

            let files = WalkDir::new(&mirror.source)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.path())
                .filter(|path| !is_temp_file(path));
            for file in files {
                if self.copy(mirror, &file) {
                    written += 1;
                }
            }
        }
        written
    }

    /// Apply one change. Returns 1 if a file was written or removed.
    fn apply(&self, event: &WatchEvent) -> usize {
        let Some(path) = event.path() else {
            return 0;
        };
        let Some(mirror) = self.mirrors.iter().find(|m| path.starts_with(&m.source)) else {
            return 0;
        };

        match event {
            WatchEvent::Remove(_) => {
                let Some(target) = mirror.target_for(path) else {
                    return 0;
                };
                match self.service.store.remove(&target) {
                    Ok(()) => 1,
                    Err(StoreError::NotFound(_)) => 0,
                    Err(e) => {
                        crate::error!(self.logger, SCOPE; "{}", e);
                        0
                    }
                }
            }
            _ if path.is_file() => usize::from(self.copy(mirror, path)),
            _ => 0,
        }
    }

    fn copy(&self, mirror: &Mirror, file: &Path) -> bool {
        let Some(target) = mirror.target_for(file) else {
            return false;
        };
        let contents = match std::fs::read(file) {
            Ok(contents) => contents,
            Err(e) => {
                crate::error!(self.logger, SCOPE; "failed to read {}: {}", file.display(), e);
                return false;
            }
        };
        match self.service.store.write(&target, contents) {
            Ok(()) => true,
            Err(e) => {
                crate::error!(self.logger, SCOPE; "{}", e);
                false
            }
        }
    }
}
