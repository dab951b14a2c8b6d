//! WebSocket Actor - live-reload broadcast
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Broadcasting publish and reload messages to all connected clients
//!
//! # Architecture
//!
//! ```text
//! Publisher --[Publish/Reload]--> WsActor --[broadcast]--> Clients
//! ```
//!
//! Delivery is at-most-once: a message that arrives while no client is
//! connected is dropped, and a failed send removes the client.

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::logger::Logger;
use crate::reload::message::HotReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::UnboundedReceiver<WsMsg>,
    /// Connected clients (shared for broadcast + read threads)
    clients: Clients,
    logger: Logger,
}

impl WsActor {
    pub fn new(rx: mpsc::UnboundedReceiver<WsMsg>, logger: Logger) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            logger,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let reader_logger = self.logger.clone();
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, reader_logger);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Publish(message) => {
                    crate::debug!(self.logger, "ws"; "publish {} {}", message.action.as_str(), message.module_name);
                    self.broadcast(Message::Text(message.to_json().into()));
                }

                WsMsg::Reload { reason } => {
                    crate::debug!(self.logger, "ws"; "sending reload: {}", reason);
                    let hr_msg = HotReloadMessage::reload_with_reason(reason);
                    self.broadcast(Message::Text(hr_msg.to_json().into()));
                }

                WsMsg::AddClient(stream) => {
                    self.add_client(stream);
                }

                WsMsg::Shutdown => {
                    crate::debug!(self.logger, "ws"; "shutting down");
                    let mut clients = self.clients.lock();
                    for mut client in clients.drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }
}
