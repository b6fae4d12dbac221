//! routing
//!
//! Pattern-based decomposition of CLI input into module, task, action and
//! params.
//!
//! # Modules
//!
//! - [`params`] - Ordered positional/named parameter containers
//! - [`pattern`] - Pattern language and compilation context
//! - [`route`] - Routes and their part mappings
//! - [`router`] - Route table and matching
//!
//! # Design Principles
//!
//! - Matching is a pure function of the route table and the input
//! - No match is a normal outcome, not an error
//! - Compilation state is explicit, never process-global

pub mod params;
pub mod pattern;
pub mod route;
pub mod router;

pub use params::{ParamKey, Params, ParamsPart, Parts};
pub use pattern::{Captured, CompiledPattern, RouteCompiler, DEFAULT_DELIMITER};
pub use route::{BeforeMatch, Converter, IntoRoutePaths, PathValue, Route, RouteError, RoutePaths};
pub use router::{Arguments, RouteDefaults, Router, RouterError};
