//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, commands print machine-readable JSON instead
//! of the text forms below.

use std::fmt::Display;

use crate::routing::{ParamKey, Params, Route};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format params as `[a, b, name=value]`.
pub fn format_params(params: &Params) -> String {
    let items: Vec<String> = params
        .iter()
        .map(|(key, value)| match key {
            ParamKey::Index(_) => value.to_string(),
            ParamKey::Name(name) => format!("{}={}", name, value),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// Format a part value, showing empty parts as `-`.
pub fn format_part(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Format one route as a block for `phiz routes`.
pub fn format_route(route: &Route) -> String {
    let mut out = format!(
        "#{} {}  {}",
        route.id(),
        route.name().unwrap_or("-"),
        route.pattern()
    );

    let compiled = route.compiled_pattern().as_str();
    if compiled != route.pattern() {
        out.push_str(&format!("\n    compiled: {}", compiled));
    }

    if !route.paths().is_empty() {
        let paths: Vec<String> = route
            .paths()
            .iter()
            .map(|(part, value)| format!("{}={}", part, value))
            .collect();
        out.push_str(&format!("\n    paths: {}", paths.join(" ")));
    }

    if let Some(description) = route.description() {
        out.push_str(&format!("\n    {}", description));
    }
    out
}
