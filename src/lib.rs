//! Phiz - pattern-based CLI argument routing and task dispatch
//!
//! Phiz decomposes command-line input into module, task, action and
//! params using a table of patterns, then dispatches the result to a task
//! handler method.
//!
//! # Architecture
//!
//! The codebase is layered, each layer depending only on those below it:
//!
//! - [`cli`] - Command-line interface for the `phiz` binary
//! - [`console`] - Application: argv parsing, modules, router to dispatcher hand-off
//! - [`config`] - TOML route table configuration
//! - [`dispatch`] - Task handlers, options and the dispatch loop
//! - [`routing`] - Patterns, routes and the router
//! - [`events`] - Lifecycle event listeners
//! - [`naming`] - Task and handler name conversions
//! - [`ui`] - User-facing output
//!
//! # Routing Invariants
//!
//! 1. Routes are tried most recently added first
//! 2. A failed match is never an error; defaults apply instead
//! 3. Route ids are unique within one compilation context
//! 4. Handling new input fully replaces the previous result

pub mod cli;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod events;
pub mod naming;
pub mod routing;
pub mod ui;
