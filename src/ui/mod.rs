//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All text meant for the user goes through this module so the quiet and
//! debug flags are honored in one place.

pub mod output;
