//! FileSystem Actor
//!
//! Watches directory trees and delivers a typed, debounced event stream.
//! The locale and scenario actors each own one [`WatchStream`].
//!
//! Architecture:
//! ```text
//! notify → bridge thread → Debouncer (pure timing) → Classifier → WatchEvent
//! ```
//!
//! The first event on every stream is [`WatchEvent::Ready`]; it is sent once
//! all existing roots are attached, so nothing that happens afterwards is lost.

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use crate::logger::Logger;
use crate::utils::path::{normalize_file, normalize_path};

// Business classification pipeline (raw changes -> actionable events).
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

pub(crate) use debouncer::is_temp_file;
pub use types::WatchEvent;
pub use watch_roots::WatchRoot;

use classifier::EventClassifier;
use debouncer::Debouncer;
use watch_roots::WatchRoots;

/// Channel buffer size
const CHANNEL_BUFFER: usize = 64;

/// How often to look for watch roots that did not exist yet
const ROOT_POLL: Duration = Duration::from_millis(500);

/// Receiving end of a file watch.
///
/// Dropping the stream stops the underlying watcher.
pub struct WatchStream {
    rx: mpsc::Receiver<WatchEvent>,
}

impl WatchStream {
    /// Stream fed by an arbitrary channel (tests, replay).
    pub fn from_channel(rx: mpsc::Receiver<WatchEvent>) -> Self {
        Self { rx }
    }

    /// Next event, or `None` once the watcher has stopped.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }

    /// An event that is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<WatchEvent> {
        self.rx.try_recv().ok()
    }
}

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Watch-root consistency layer (attach/re-attach root directories)
    watch_roots: WatchRoots,
    /// Only report these exact files (scenario files watched via their parent dir)
    only: Option<FxHashSet<PathBuf>>,
    events_tx: mpsc::Sender<WatchEvent>,
    debouncer: Debouncer,
    logger: Logger,
}

impl FsActor {
    /// Attach the watcher and return the actor plus the stream it feeds.
    ///
    /// Events produced while the caller sets up are buffered, not dropped.
    pub fn new(
        roots: Vec<WatchRoot>,
        only: Option<Vec<PathBuf>>,
        logger: Logger,
    ) -> notify::Result<(Self, WatchStream)> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let roots = roots
            .into_iter()
            .map(|root| WatchRoot {
                path: normalize_path(&root.path),
                ..root
            })
            .collect();
        let mut watch_roots = WatchRoots::new(roots);
        watch_roots.attach_existing(&mut watcher)?;

        let only = only.map(|files| files.iter().map(|p| normalize_file(p)).collect());
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_BUFFER);

        let actor = Self {
            notify_rx,
            watcher,
            watch_roots,
            only,
            events_tx,
            debouncer: Debouncer::new(logger.clone()),
            logger,
        };
        Ok((actor, WatchStream::from_channel(events_rx)))
    }

    /// Attach the watcher and run it on the current tokio runtime.
    pub fn spawn(
        roots: Vec<WatchRoot>,
        only: Option<Vec<PathBuf>>,
        logger: Logger,
    ) -> notify::Result<WatchStream> {
        let (actor, stream) = Self::new(roots, only, logger)?;
        tokio::spawn(actor.run());
        Ok(stream)
    }

    /// Run the actor event loop until the stream is dropped.
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            only,
            events_tx,
            mut debouncer,
            logger,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(CHANNEL_BUFFER);
        let error_tx = events_tx.clone();

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                let sent = match result {
                    Ok(event) => async_tx.blocking_send(event).is_ok(),
                    Err(e) => error_tx.blocking_send(WatchEvent::Error(e.to_string())).is_ok(),
                };
                if !sent {
                    break; // Receiver dropped
                }
            }
        });

        if events_tx.send(WatchEvent::Ready).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                biased;
                _ = events_tx.closed() => break,
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(next_tick(&debouncer, &watch_roots)) => {
                    watch_roots.maintain(&mut watcher, &logger);
                    let classifier = EventClassifier { only: only.as_ref(), logger: &logger };
                    if flush(&mut debouncer, &classifier, &events_tx).await.is_err() {
                        break;
                    }
                }
            }
        }

        crate::debug!(logger, "watch"; "watcher stopped");
    }
}

/// Sleep until the debounce window closes, polling sooner while a root is missing.
fn next_tick(debouncer: &Debouncer, watch_roots: &WatchRoots) -> Duration {
    let sleep = debouncer.sleep_duration();
    if watch_roots.has_detached() {
        sleep.min(ROOT_POLL)
    } else {
        sleep
    }
}

/// Forward debounced changes in first-seen order.
///
/// Returns `Err(())` if the stream was dropped.
async fn flush(
    debouncer: &mut Debouncer,
    classifier: &EventClassifier<'_>,
    events_tx: &mpsc::Sender<WatchEvent>,
) -> Result<(), ()> {
    let Some(raw) = debouncer.take_if_ready() else {
        return Ok(());
    };

    for (path, kind) in classifier.classify(raw) {
        crate::debug!(classifier.logger, "watch"; "{}: {}", kind.label(), path.display());
        events_tx
            .send(kind.into_event(path))
            .await
            .map_err(|_| ())?;
    }

    Ok(())
}
