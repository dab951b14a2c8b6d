use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tungstenite::protocol::Message;

use super::{Clients, WsActor};
use crate::logger::Logger;
use crate::reload::message::HotReloadMessage;

impl WsActor {
    /// Add a new client connection
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let _ = ws.get_ref().set_nonblocking(true);

                let connected_msg = HotReloadMessage::connected();
                if let Err(e) = ws.send(Message::Text(connected_msg.to_json().into())) {
                    crate::warn!(self.logger, "ws"; "failed to send connected message: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                crate::debug!(self.logger, "ws"; "client connected (total: {})", clients.len() + 1);
                clients.push(ws);
            }
            Err(e) => {
                crate::warn!(self.logger, "ws"; "handshake failed: {}", e);
            }
        }
    }

    /// Background thread that drains client frames and drops closed sockets.
    ///
    /// Clients never send anything meaningful; reading is only how a close
    /// or a dead peer is noticed between broadcasts. Exits once the actor
    /// (the only other owner of `clients`) is gone.
    pub(super) fn client_reader_loop(clients: Clients, logger: Logger) {
        loop {
            std::thread::sleep(Duration::from_millis(100));

            if Arc::strong_count(&clients) == 1 {
                break;
            }

            let mut clients_guard = clients.lock();
            clients_guard.retain_mut(|ws| match ws.read() {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    true
                }
                Err(e) => {
                    crate::debug!(logger, "ws"; "client dropped: {}", e);
                    false
                }
            });
        }
    }
}
