//! Live reload over WebSocket.
//!
//! ```text
//! LocaleActor / ScenarioActor / BuildService
//!          |  Publisher
//!          v
//!       WsActor --> Browser (hotreload.js)
//! ```
//!
//! - `message` - wire messages sent to the browser
//! - `publish` - cheap-clone handle every watcher publishes through
//! - `server` - TCP listener handing connections to the actor

pub mod message;
pub mod publish;
pub mod server;

pub use publish::Publisher;
