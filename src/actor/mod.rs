//! Actor System for the sandbox
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --> LocaleActor ----+
//! FsActor --> ScenarioActor --+--> WsActor --> Clients
//! FsActor --> OutputMirror ---+
//! ```
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `ws` - WebSocket broadcast

pub mod fs;
pub mod messages;
pub mod ws;
