//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands, and must come before any
//! routed arguments:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Route table to load instead of the default locations
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Phiz - pattern-based CLI routing and task dispatch
#[derive(Parser, Debug)]
#[command(name = "phiz")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Route table to load (default: $PHIZ_ROUTES, then
    /// $XDG_CONFIG_HOME/phiz/routes.toml, then ~/.phiz/routes.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show how arguments are routed, without running anything
    #[command(
        name = "match",
        long_about = "Route the given arguments through the route table and show \
            the resulting module, task, action and params.\n\n\
            Arguments are joined with the route delimiter and matched against \
            the routes, most recently added first. With --parts they are taken \
            as task, action and params directly.",
        after_help = "\
EXAMPLES:
    # Built-in task/action route
    phiz match echo hello world

    # Inspect a custom route from the config file
    phiz --config routes.toml match posts 2010 hello

    # Skip pattern matching
    phiz match --parts echo hello"
    )]
    Match {
        /// Take arguments as task, action and params instead of matching
        #[arg(long)]
        parts: bool,

        /// Arguments to route
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List the route table, in insertion order
    Routes,

    /// Route the arguments and dispatch them to a task
    #[command(after_help = "\
BUILT-IN TASKS:
    main        main            Lists the built-in tasks
    echo        main            Prints its arguments (--case=upper|lower)
    echo        params          Prints params and options as JSON

EXAMPLES:
    phiz run echo main hello world
    phiz run echo main hello --case=upper
    phiz run echo params a b --flag")]
    Run {
        /// Arguments to route; `--name=value`, `--flag` and `-f` become options
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Generate shell completion scripts
    #[command(after_help = "\
EXAMPLES:
    # Bash
    phiz completion bash > ~/.local/share/bash-completion/completions/phiz

    # Zsh
    phiz completion zsh > ~/.zfunc/_phiz")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_passes_options_through() {
        let cli = Cli::try_parse_from(["phiz", "run", "echo", "main", "--case=upper", "-v"]).unwrap();
        match cli.command {
            Command::Run { args } => {
                assert_eq!(args, vec!["echo", "main", "--case=upper", "-v"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_before_args() {
        let cli = Cli::try_parse_from(["phiz", "--json", "-q", "match", "--parts", "echo"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Match { parts: true, .. }));
    }
}
