//! dispatch
//!
//! Turns a routed `(task, action, params)` triple into a call on a task
//! handler.
//!
//! # Modules
//!
//! - [`dispatcher`] - The dispatch loop
//! - [`task`] - Task handlers and their registry
//! - [`options`] - Named CLI switches
//! - [`filter`] - Option sanitizers

pub mod dispatcher;
pub mod filter;
pub mod options;
pub mod task;

pub use dispatcher::{DispatchError, Dispatcher, MAX_DISPATCH_HOPS};
pub use filter::{Filter, FilterError};
pub use options::{OptionValue, Options};
pub use task::{ActionContext, ActionFn, FnTask, Forward, Task, TaskRegistry};
