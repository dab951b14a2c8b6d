//! Publish channel shared by every watcher.

use tokio::sync::mpsc;

use super::message::PublishMessage;
use crate::actor::messages::WsMsg;

/// Cheap-clone handle bound to the WebSocket actor.
///
/// `publish` never blocks and never fails: delivery is at-most-once and a
/// message sent while no client is connected is dropped by the actor.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<WsMsg>,
}

impl Publisher {
    pub fn new(tx: mpsc::UnboundedSender<WsMsg>) -> Self {
        Self { tx }
    }

    /// Publisher with nothing on the other end (live reload disabled).
    pub fn detached() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }

    /// Publisher plus the receiving end, for observing what was sent.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WsMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, message: PublishMessage) {
        let _ = self.tx.send(WsMsg::Publish(message));
    }

    /// Ask every client to reload the page.
    pub fn reload(&self, reason: impl Into<String>) {
        let _ = self.tx.send(WsMsg::Reload {
            reason: reason.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::message::PublishAction;

    fn message() -> PublishMessage {
        PublishMessage {
            action: PublishAction::LocaleAdd,
            path: "/a/locale/en-US.json".into(),
            module_name: "a".into(),
            locale: Some("en-us".into()),
        }
    }

    #[test]
    fn test_clones_share_channel() {
        let (publisher, mut rx) = Publisher::channel();
        let other = publisher.clone();

        publisher.publish(message());
        other.reload("rebuilt");

        assert!(matches!(rx.try_recv(), Ok(WsMsg::Publish(m)) if m == message()));
        assert!(matches!(rx.try_recv(), Ok(WsMsg::Reload { reason }) if reason == "rebuilt"));
    }

    #[test]
    fn test_detached_is_silent() {
        Publisher::detached().publish(message());
    }
}
