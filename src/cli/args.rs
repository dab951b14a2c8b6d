//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Local development sandbox for federated UI modules
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sandbox.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "sandbox.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the development server with hot reload
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Live reload WebSocket port
        #[arg(long)]
        ws_port: Option<u16>,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long, conflicts_with = "quiet")]
        verbose: bool,

        /// Only print errors
        #[arg(short, long)]
        quiet: bool,

        /// Do not watch language packs
        #[arg(long)]
        no_locale: bool,

        /// Do not serve mock scenarios
        #[arg(long)]
        no_scenarios: bool,
    },

    /// Print the unified module map as JSON
    #[command(visible_alias = "m")]
    Map {
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_map(&self) -> bool {
        matches!(self.command, Commands::Map { .. })
    }
}
