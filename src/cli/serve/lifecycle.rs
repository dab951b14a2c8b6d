//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tiny_http::Server;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::UnboundedSender;

use crate::actor::messages::WsMsg;
use crate::build::{BuildEvent, BuildService, wait_until_valid};
use crate::locale::LocaleWatcher;
use crate::logger::Logger;
use crate::reload::Publisher;
use crate::scenario::ScenarioWatcher;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: IpAddr,
    base_port: u16,
    logger: &Logger,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                if offset > 0 {
                    crate::log!(logger, "serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Stop the live reload actor once Ctrl+C is received.
pub fn forward_shutdown(shutdown_rx: Receiver<()>, ws_tx: UnboundedSender<WsMsg>) {
    std::thread::spawn(move || {
        if shutdown_rx.recv().is_ok() {
            let _ = ws_tx.send(WsMsg::Shutdown);
        }
    });
}

/// Everything that must settle before the sandbox is usable.
pub struct Readiness {
    pub build: Arc<dyn BuildService>,
    pub locale: Option<LocaleWatcher>,
    pub scenarios: Option<ScenarioWatcher>,
}

/// Log the ready banner once the build output, language packs and scenarios
/// have all been loaded.
pub async fn announce_when_ready(readiness: Readiness, address: String, logger: Logger) {
    let Readiness {
        build,
        locale,
        scenarios,
    } = readiness;

    wait_until_valid(build.as_ref()).await;
    if let Some(mut locale) = locale {
        locale.ready().await;
    }
    if let Some(mut scenarios) = scenarios {
        scenarios.ready().await;
    }

    crate::info!(logger, "serve"; "🔥 HMR server is ready - visit {}", address);
}

/// Reload every browser after each rebuild that follows the initial one.
pub async fn reload_on_rebuild(build: Arc<dyn BuildService>, publisher: Publisher, logger: Logger) {
    wait_until_valid(build.as_ref()).await;
    let mut events = build.subscribe();

    loop {
        match events.recv().await {
            Ok(BuildEvent::Done { files, .. }) => {
                crate::debug!(logger, "build"; "{} output files changed, reloading", files);
                publisher.reload("module output rebuilt");
            }
            Ok(BuildEvent::Invalid) => {}
            Err(RecvError::Lagged(skipped)) => {
                crate::debug!(logger, "build"; "skipped {} build events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogKind, MemorySink};
    use crate::store::{BuildOutputStore, MemoryStore};
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use tokio::sync::{broadcast, watch};

    struct FakeBuild {
        valid: watch::Sender<bool>,
        events: broadcast::Sender<BuildEvent>,
    }

    impl BuildService for FakeBuild {
        fn output(&self) -> Arc<dyn BuildOutputStore> {
            Arc::new(MemoryStore::new())
        }

        fn subscribe(&self) -> broadcast::Receiver<BuildEvent> {
            self.events.subscribe()
        }

        fn validity(&self) -> watch::Receiver<bool> {
            self.valid.subscribe()
        }
    }

    #[test]
    fn test_bind_retries_next_port() {
        let (logger, sink) = MemorySink::logger();
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);

        let (_first, addr) = bind_with_retry(localhost, 0, &logger).unwrap();
        let taken = addr.port();
        let (_second, next) = bind_with_retry(localhost, taken, &logger).unwrap();

        assert_ne!(next.port(), taken);
        assert_eq!(sink.matching(LogKind::Log, "in use, using"), 1);
    }

    #[tokio::test]
    async fn test_banner_waits_for_valid_build() {
        let (valid, _) = watch::channel(false);
        let (events, _) = broadcast::channel(4);
        let build = Arc::new(FakeBuild { valid, events });
        let (logger, sink) = MemorySink::logger();

        let readiness = Readiness {
            build: Arc::clone(&build) as Arc<dyn BuildService>,
            locale: None,
            scenarios: None,
        };
        let task = tokio::spawn(announce_when_ready(
            readiness,
            "http://localhost:3000".into(),
            logger,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.count(LogKind::Info), 0);

        build.valid.send_replace(true);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            sink.matching(LogKind::Info, "HMR server is ready - visit http://localhost:3000"),
            1
        );
    }

    #[tokio::test]
    async fn test_rebuild_after_valid_reloads() {
        let (valid, _) = watch::channel(false);
        let (events, _) = broadcast::channel(4);
        let build = Arc::new(FakeBuild { valid, events });
        let (publisher, mut published) = Publisher::channel();
        let (logger, _) = MemorySink::logger();

        tokio::spawn(reload_on_rebuild(
            Arc::clone(&build) as Arc<dyn BuildService>,
            publisher,
            logger,
        ));

        // the initial build is not a rebuild
        build.events.send(BuildEvent::Done { elapsed: Duration::ZERO, files: 2 }).ok();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(published.try_recv().is_err());

        build.valid.send_replace(true);
        while build.events.receiver_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        build.events.send(BuildEvent::Invalid).unwrap();
        build.events.send(BuildEvent::Done { elapsed: Duration::ZERO, files: 1 }).unwrap();

        let message = tokio::time::timeout(Duration::from_secs(2), published.recv())
            .await
            .unwrap();
        assert!(matches!(message, Some(WsMsg::Reload { reason }) if reason == "module output rebuilt"));
        assert!(published.try_recv().is_err());
    }
}
