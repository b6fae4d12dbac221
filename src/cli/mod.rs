//! cli
//!
//! Command-line interface layer for Phiz.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging
//! - Load the route table and delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Routing lives in [`crate::routing`], dispatching
//! in [`crate::dispatch`] and [`crate::console`]; handlers here only build
//! those from configuration and format their results.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
    pub json: bool,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let ctx = Context {
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr, filtered by `RUST_LOG` or `--debug`.
fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "phiz_cli=debug" } else { "warn" }));

    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
