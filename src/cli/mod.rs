//! Command-line interface module.

mod args;
pub mod map;
pub mod serve;

pub use args::{Cli, Commands};
