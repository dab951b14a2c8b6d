use tungstenite::protocol::Message;

use super::WsActor;

impl WsActor {
    /// Broadcast a message to all connected clients
    pub(super) fn broadcast(&self, msg: Message) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!(self.logger, "ws"; "no clients connected, message dropped");
            return;
        }

        clients.retain_mut(|ws| match ws.send(msg.clone()) {
            Ok(_) => true,
            Err(e) => {
                crate::debug!(self.logger, "ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!(self.logger, "ws"; "broadcast to {} clients", count);
    }
}
