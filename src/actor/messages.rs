//! Actor Message Definitions
//!
//! ```text
//! LocaleActor  --Publish--+
//! ScenarioActor --Publish--+--> WsActor --> Clients
//! BuildService --Reload---+
//! ```

use crate::reload::message::PublishMessage;

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Forward a change notification to every client
    Publish(PublishMessage),
    /// Reload page on every client
    Reload { reason: String },
    /// Add client
    AddClient(std::net::TcpStream),
    /// Shutdown
    Shutdown,
}
