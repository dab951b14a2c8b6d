//! WebSocket listener for live reload.
//!
//! Accepts raw TCP connections and hands them to the WebSocket actor,
//! which performs the handshake and owns the client from then on.

use std::net::TcpListener;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;

use crate::actor::messages::WsMsg;
use crate::core::is_shutdown;
use crate::logger::Logger;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Bind the live-reload listener and start the acceptor thread.
///
/// Returns the port actually bound, which may be above `base_port` when
/// that one is taken.
pub fn start_ws_server_with_channel(
    interface: &str,
    base_port: u16,
    ws_tx: UnboundedSender<WsMsg>,
    logger: Logger,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        while !is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!(logger, "serve"; "live reload client connected: {}", addr);

                    // Blocking for the handshake; the actor flips it back
                    let _ = stream.set_nonblocking(false);

                    if ws_tx.send(WsMsg::AddClient(stream)).is_err() {
                        crate::debug!(logger, "serve"; "live reload actor is gone, stopping listener");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    crate::warn!(logger, "serve"; "live reload accept error: {}", e);
                    std::thread::sleep(ACCEPT_POLL);
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: &str, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind live reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemorySink;

    #[test]
    fn test_bind_skips_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        match try_bind_port("127.0.0.1", port, 3) {
            Ok((_, bound)) => assert_ne!(bound, port),
            // neighbours may be taken on a busy host
            Err(e) => assert!(e.to_string().contains("3 attempts")),
        }
    }

    #[test]
    fn test_accepted_stream_reaches_actor() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let (logger, _) = MemorySink::logger();
        let port = start_ws_server_with_channel("127.0.0.1", 0, tx, logger).unwrap();

        let _client = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            match rx.try_recv() {
                Ok(WsMsg::AddClient(_)) => break,
                Ok(other) => panic!("unexpected message: {other:?}"),
                Err(_) if std::time::Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(20))
                }
                Err(e) => panic!("no client forwarded: {e}"),
            }
        }
    }
}
