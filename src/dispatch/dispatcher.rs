//! dispatch::dispatcher
//!
//! Resolves `(namespace, task, action)` to a handler method and runs it,
//! following forwards until an action finishes without one.
//!
//! # Dispatch Loop
//!
//! ```text
//! beforeDispatchLoop
//! loop:
//!   beforeDispatch -> resolve handler -> beforeExecuteRoute
//!   -> Task::before_execute_route -> Task::initialize (first time)
//!   -> afterInitialize -> action -> afterExecuteRoute
//!   -> Task::after_execute_route -> (forward? loop again) -> afterDispatch
//! afterDispatchLoop
//! ```
//!
//! Any `dispatch:*` listener returning `Some(false)` stops the loop. A
//! `dispatch:beforeException` veto turns an error into a quiet stop.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, trace};

use super::filter::{Filter, FilterError};
use super::options::Options;
use super::task::{ActionContext, Forward, Task, TaskRegistry};
use crate::events::{vetoed, EventsManager};
use crate::naming::{camelize, is_valid_handler_name};
use crate::routing::{ParamKey, Params};

/// Upper bound on forwards within one dispatch.
pub const MAX_DISPATCH_HOPS: usize = 256;

/// Errors from dispatching.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{handler} handler class cannot be loaded")]
    HandlerNotFound { handler: String },

    #[error("invalid handler name '{handler}'")]
    InvalidHandler { handler: String },

    #[error("action '{action}' was not found on handler '{handler}'")]
    ActionNotFound { handler: String, action: String },

    #[error("'{method}' on '{handler}' needs at least {required} argument(s), {given} given")]
    InvalidParams {
        handler: String,
        method: String,
        required: usize,
        given: usize,
    },

    #[error("dispatcher has detected a cyclic routing after {0} forwards")]
    CyclicRouting(usize),

    #[error("'{method}' on '{handler}' failed")]
    Action {
        handler: String,
        method: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Task dispatcher.
#[derive(Debug)]
pub struct Dispatcher {
    tasks: TaskRegistry,
    filter: Filter,
    events: Option<Arc<EventsManager>>,

    default_namespace: String,
    namespace: String,
    module: String,
    task: String,
    action: String,
    params: Params,
    options: Options,

    default_task: String,
    default_action: String,
    handler_suffix: String,
    action_suffix: String,

    active_task: Option<String>,
    last_task: Option<String>,
    initialized: HashSet<String>,
    returned_value: Option<Value>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(TaskRegistry::new())
    }
}

impl Dispatcher {
    pub fn new(tasks: TaskRegistry) -> Self {
        Self {
            tasks,
            filter: Filter::new(),
            events: None,
            default_namespace: String::new(),
            namespace: String::new(),
            module: String::new(),
            task: String::new(),
            action: String::new(),
            params: Params::new(),
            options: Options::new(),
            default_task: "main".to_string(),
            default_action: "main".to_string(),
            handler_suffix: "Task".to_string(),
            action_suffix: "Action".to_string(),
            active_task: None,
            last_task: None,
            initialized: HashSet::new(),
            returned_value: None,
        }
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskRegistry {
        &mut self.tasks
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) -> &mut Self {
        self.filter = filter;
        self
    }

    pub fn events_manager(&self) -> Option<&Arc<EventsManager>> {
        self.events.as_ref()
    }

    pub fn set_events_manager(&mut self, events: Arc<EventsManager>) -> &mut Self {
        self.events = Some(events);
        self
    }

    // Names

    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.default_namespace = namespace.into();
        self
    }

    pub fn namespace_name(&self) -> &str {
        &self.namespace
    }

    pub fn set_namespace_name(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = namespace.into();
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    pub fn set_module_name(&mut self, module: impl Into<String>) -> &mut Self {
        self.module = module.into();
        self
    }

    pub fn task_name(&self) -> &str {
        &self.task
    }

    pub fn set_task_name(&mut self, task: impl Into<String>) -> &mut Self {
        self.task = task.into();
        self
    }

    pub fn action_name(&self) -> &str {
        &self.action
    }

    pub fn set_action_name(&mut self, action: impl Into<String>) -> &mut Self {
        self.action = action.into();
        self
    }

    pub fn set_default_task(&mut self, task: impl Into<String>) -> &mut Self {
        self.default_task = task.into();
        self
    }

    pub fn set_default_action(&mut self, action: impl Into<String>) -> &mut Self {
        self.default_action = action.into();
        self
    }

    pub fn set_handler_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.handler_suffix = suffix.into();
        self
    }

    pub fn set_action_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.action_suffix = suffix.into();
        self
    }

    // Params and options

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.params = params;
        self
    }

    pub fn get_param(&self, key: impl Into<ParamKey>) -> Option<&str> {
        self.params.get_key(&key.into())
    }

    pub fn has_param(&self, key: impl Into<ParamKey>) -> bool {
        self.get_param(key).is_some()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) -> &mut Self {
        self.options = options;
        self
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains(name)
    }

    /// Option value run through `filters`, or `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Filter` if a filter name is unknown.
    pub fn get_option(
        &self,
        name: &str,
        filters: &[&str],
        default: Option<&str>,
    ) -> Result<Option<String>, DispatchError> {
        match self.options.get(name) {
            Some(value) => Ok(Some(self.filter.sanitize_all(value.as_str(), filters)?)),
            None => Ok(default.map(str::to_string)),
        }
    }

    // Resolution

    /// Handler class for the current task, e.g. `App\Tasks\EchoTask`.
    pub fn handler_class(&self) -> String {
        let task = if self.task.is_empty() {
            &self.default_task
        } else {
            &self.task
        };
        let namespace = if self.namespace.is_empty() {
            &self.default_namespace
        } else {
            &self.namespace
        };

        let stem = format!("{}{}", camelize(task), self.handler_suffix);
        if namespace.is_empty() {
            stem
        } else {
            format!("{}\\{}", namespace.trim_end_matches('\\'), stem)
        }
    }

    /// Method for the current action, e.g. `showAllAction` for `show-all`.
    pub fn active_method(&self) -> String {
        let action = if self.action.is_empty() {
            &self.default_action
        } else {
            &self.action
        };
        let camel = camelize(action);
        let mut chars = camel.chars();
        let lowered: String = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("{}{}", lowered, self.action_suffix)
    }

    pub fn active_task_name(&self) -> Option<&str> {
        self.active_task.as_deref()
    }

    pub fn last_task_name(&self) -> Option<&str> {
        self.last_task.as_deref()
    }

    /// Handler instance currently being dispatched to.
    pub fn active_task(&self) -> Option<&dyn Task> {
        self.active_task
            .as_deref()
            .and_then(|class| self.tasks.get(class))
    }

    /// Handler instance that last completed an action.
    pub fn last_task(&self) -> Option<&dyn Task> {
        self.last_task
            .as_deref()
            .and_then(|class| self.tasks.get(class))
    }

    /// Value returned by the last action.
    pub fn returned_value(&self) -> Option<&Value> {
        self.returned_value.as_ref()
    }

    /// Replace task, action and params for the next dispatch iteration.
    pub fn forward(&mut self, forward: Forward) {
        if let Some(task) = forward.task {
            self.task = task;
        }
        if let Some(action) = forward.action {
            self.action = action;
        }
        if let Some(params) = forward.params {
            self.params = params;
        }
    }

    /// Run the current action, following forwards.
    ///
    /// Returns `Ok(false)` if an event listener or a task hook stopped the
    /// dispatch, `Ok(true)` once the last action finished.
    ///
    /// # Errors
    ///
    /// Fails when the handler or action cannot be resolved, the action
    /// fails or keeps forwarding past [`MAX_DISPATCH_HOPS`], unless a
    /// `dispatch:beforeException` listener vetoes the error.
    pub fn dispatch(&mut self) -> Result<bool, DispatchError> {
        let events = self.events.clone();
        let events = events.as_deref();

        if vetoed(events, "dispatch:beforeDispatchLoop", Value::Null) {
            return Ok(false);
        }

        let mut hops = 0;
        loop {
            hops += 1;
            if hops > MAX_DISPATCH_HOPS {
                return raise(events, DispatchError::CyclicRouting(MAX_DISPATCH_HOPS));
            }

            if self.task.is_empty() {
                self.task = self.default_task.clone();
            }
            if self.action.is_empty() {
                self.action = self.default_action.clone();
            }

            if vetoed(events, "dispatch:beforeDispatch", self.state()) {
                return Ok(false);
            }

            let class = self.handler_class();
            let method = self.active_method();
            debug!(handler = %class, method = %method, "Dispatching");

            if !is_valid_handler_name(&class) {
                return raise(events, DispatchError::InvalidHandler { handler: class });
            }

            let state = self.state();
            let Some(task) = self.tasks.get_shared(&class) else {
                return raise(events, DispatchError::HandlerNotFound { handler: class });
            };
            self.active_task = Some(class.clone());

            if !task.has_method(&method) {
                if vetoed(events, "dispatch:beforeNotFoundAction", state) {
                    return Ok(false);
                }
                return raise(
                    events,
                    DispatchError::ActionNotFound {
                        handler: class,
                        action: self.action.clone(),
                    },
                );
            }

            if vetoed(events, "dispatch:beforeExecuteRoute", state.clone()) {
                return Ok(false);
            }
            if !task.before_execute_route(&method) {
                return Ok(false);
            }

            if self.initialized.insert(class.clone()) {
                trace!(handler = %class, "Initializing handler");
                task.initialize();
                if vetoed(events, "dispatch:afterInitialize", state.clone()) {
                    return Ok(false);
                }
            }

            let (result, forward) = {
                let mut ctx = ActionContext::new(
                    &self.task,
                    &self.action,
                    &self.params,
                    &self.options,
                    &self.filter,
                );
                let required = task.required_args(&method);
                let given = ctx.args().positional().count();
                if given < required {
                    return raise(
                        events,
                        DispatchError::InvalidParams {
                            handler: class,
                            method,
                            required,
                            given,
                        },
                    );
                }
                let result = task.call(&method, &mut ctx);
                (result, ctx.forward.take())
            };

            match result {
                Ok(value) => self.returned_value = Some(value),
                Err(source) => {
                    return raise(
                        events,
                        DispatchError::Action {
                            handler: class,
                            method,
                            source: source.into(),
                        },
                    );
                }
            }

            if vetoed(events, "dispatch:afterExecuteRoute", state.clone()) {
                return Ok(false);
            }
            task.after_execute_route(&method);
            self.last_task = Some(class);

            if let Some(forward) = forward {
                debug!(?forward, "Forwarding");
                self.forward(forward);
                continue;
            }

            if vetoed(events, "dispatch:afterDispatch", state) {
                return Ok(false);
            }
            break;
        }

        vetoed(events, "dispatch:afterDispatchLoop", Value::Null);
        Ok(true)
    }

    fn state(&self) -> Value {
        json!({
            "namespace": self.namespace,
            "module": self.module,
            "task": self.task,
            "action": self.action,
            "params": self.params,
        })
    }
}

fn raise(events: Option<&EventsManager>, error: DispatchError) -> Result<bool, DispatchError> {
    let data = json!({ "error": error.to_string() });
    if vetoed(events, "dispatch:beforeException", data) {
        debug!(%error, "Dispatch error swallowed by listener");
        return Ok(false);
    }
    Err(error)
}
