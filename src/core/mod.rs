//! Core types - pure abstractions shared across the codebase.

pub mod paths;
mod state;

pub use paths::Paths;
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
