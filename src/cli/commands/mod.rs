//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the route table through [`load_router`]
//! 2. Routes (and for `run`, dispatches) the arguments
//! 3. Formats and displays output

mod completion;
mod match_cmd;
mod routes;
mod run;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use match_cmd::match_args;
pub use routes::routes;
pub use run::{builtin_tasks, run};

use anyhow::{Context as _, Result};
use tracing::warn;

use super::args::Command;
use super::Context;
use crate::config::Config;
use crate::routing::Router;
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Match { parts, args } => match_cmd::match_args(ctx, &args, parts),
        Command::Routes => routes::routes(ctx),
        Command::Run { args } => run::run(ctx, &args),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load the configured route table, reporting config warnings.
pub fn load_router(ctx: &Context) -> Result<Router> {
    let loaded = Config::load(ctx.config.as_deref()).context("Failed to load route config")?;

    for warning in &loaded.warnings {
        warn!(path = %warning.path.display(), "{}", warning.message);
        output::warn(&warning.message, ctx.verbosity());
    }
    if let Some(path) = loaded.config.loaded_from() {
        output::debug(format!("routes loaded from {}", path.display()), ctx.verbosity());
    }

    loaded
        .config
        .build_router()
        .context("Failed to build route table")
}
