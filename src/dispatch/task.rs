//! dispatch::task
//!
//! Task handlers, the context an action runs in, and the registry the
//! dispatcher resolves handler classes from.

use std::collections::HashMap;

use serde_json::Value;

use super::filter::{Filter, FilterError};
use super::options::Options;
use crate::routing::Params;

/// A task handler: a named set of action methods plus lifecycle hooks.
pub trait Task {
    /// Whether the handler answers `method` (e.g. `helloAction`).
    fn has_method(&self, method: &str) -> bool;

    /// Minimum number of positional arguments `method` needs.
    fn required_args(&self, _method: &str) -> usize {
        0
    }

    /// Run an action method.
    fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value>;

    /// Called once, the first time the handler is dispatched to.
    fn initialize(&mut self) {}

    /// Called before every action. Returning `false` stops the dispatch.
    fn before_execute_route(&mut self, _method: &str) -> bool {
        true
    }

    /// Called after every action.
    fn after_execute_route(&mut self, _method: &str) {}
}

/// Action method signature for [`FnTask`].
pub type ActionFn = Box<dyn FnMut(&mut ActionContext<'_>) -> anyhow::Result<Value>>;

struct Method {
    required: usize,
    action: ActionFn,
}

/// A [`Task`] assembled from closures.
///
/// # Example
///
/// ```
/// use phiz_cli::dispatch::{FnTask, Task};
/// use serde_json::json;
///
/// let task = FnTask::new()
///     .method("mainAction", |_| Ok(json!("hi")))
///     .method_with_args("greetAction", 1, |ctx| {
///         Ok(json!(format!("hello {}", ctx.arg(0).unwrap_or_default())))
///     });
///
/// assert!(task.has_method("greetAction"));
/// assert_eq!(task.required_args("greetAction"), 1);
/// assert!(!task.has_method("missingAction"));
/// ```
#[derive(Default)]
pub struct FnTask {
    methods: Vec<(String, Method)>,
    on_initialize: Option<Box<dyn FnMut()>>,
}

impl std::fmt::Debug for FnTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTask")
            .field(
                "methods",
                &self.methods.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FnTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(
        self,
        name: impl Into<String>,
        action: impl FnMut(&mut ActionContext<'_>) -> anyhow::Result<Value> + 'static,
    ) -> Self {
        self.method_with_args(name, 0, action)
    }

    /// Add a method that needs at least `required` positional arguments.
    pub fn method_with_args(
        mut self,
        name: impl Into<String>,
        required: usize,
        action: impl FnMut(&mut ActionContext<'_>) -> anyhow::Result<Value> + 'static,
    ) -> Self {
        self.methods.push((
            name.into(),
            Method {
                required,
                action: Box::new(action),
            },
        ));
        self
    }

    pub fn on_initialize(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_initialize = Some(Box::new(hook));
        self
    }

    fn find(&mut self, method: &str) -> Option<&mut Method> {
        self.methods
            .iter_mut()
            .find(|(n, _)| n == method)
            .map(|(_, m)| m)
    }
}

impl Task for FnTask {
    fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|(n, _)| n == method)
    }

    fn required_args(&self, method: &str) -> usize {
        self.methods
            .iter()
            .find(|(n, _)| n == method)
            .map_or(0, |(_, m)| m.required)
    }

    fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value> {
        match self.find(method) {
            Some(m) => (m.action)(ctx),
            None => anyhow::bail!("no method '{}'", method),
        }
    }

    fn initialize(&mut self) {
        if let Some(hook) = self.on_initialize.as_mut() {
            hook();
        }
    }
}

/// Where to go next after the current action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forward {
    pub task: Option<String>,
    pub action: Option<String>,
    pub params: Option<Params>,
}

impl Forward {
    pub fn to(task: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            task: Some(task.into()),
            action: Some(action.into()),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

/// What an action sees while it runs.
pub struct ActionContext<'a> {
    pub(crate) task: &'a str,
    pub(crate) action: &'a str,
    pub(crate) params: &'a Params,
    pub(crate) options: &'a Options,
    pub(crate) filter: &'a Filter,
    pub(crate) args: Params,
    pub(crate) forward: Option<Forward>,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(
        task: &'a str,
        action: &'a str,
        params: &'a Params,
        options: &'a Options,
        filter: &'a Filter,
    ) -> Self {
        let args = params.clone().merge(options.to_params());
        Self {
            task,
            action,
            params,
            options,
            filter,
            args,
            forward: None,
        }
    }

    pub fn task_name(&self) -> &str {
        self.task
    }

    pub fn action_name(&self) -> &str {
        self.action
    }

    pub fn params(&self) -> &Params {
        self.params
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Params with options appended as named entries.
    pub fn args(&self) -> &Params {
        &self.args
    }

    /// Positional argument by index.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains(name)
    }

    /// Option value run through `filters`, or `default` when absent.
    pub fn option(
        &self,
        name: &str,
        filters: &[&str],
        default: Option<&str>,
    ) -> Result<Option<String>, FilterError> {
        match self.options.get(name) {
            Some(value) => self.filter.sanitize_all(value.as_str(), filters).map(Some),
            None => Ok(default.map(str::to_string)),
        }
    }

    /// Ask the dispatcher to run another action once this one returns.
    pub fn forward(&mut self, forward: Forward) {
        self.forward = Some(forward);
    }
}

type TaskFactory = Box<dyn Fn() -> Box<dyn Task>>;

/// Handler classes the dispatcher can resolve, instantiated lazily and
/// shared across dispatches.
#[derive(Default)]
pub struct TaskRegistry {
    factories: Vec<(String, TaskFactory)>,
    shared: HashMap<String, Box<dyn Task>>,
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shared: Vec<_> = self.shared.keys().collect();
        shared.sort();
        f.debug_struct("TaskRegistry")
            .field("classes", &self.classes().collect::<Vec<_>>())
            .field("shared", &shared)
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler class. Replaces any earlier registration and drops
    /// its shared instance.
    pub fn register<F, T>(&mut self, class: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> T + 'static,
        T: Task + 'static,
    {
        let class = class.into();
        self.shared.remove(&class);
        let factory: TaskFactory = Box::new(move || -> Box<dyn Task> { Box::new(factory()) });
        match self.factories.iter_mut().find(|(c, _)| *c == class) {
            Some((_, existing)) => *existing = factory,
            None => self.factories.push((class, factory)),
        }
        self
    }

    pub fn has(&self, class: &str) -> bool {
        self.factories.iter().any(|(c, _)| c == class)
    }

    /// Registered class names, in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(c, _)| c.as_str())
    }

    /// Shared instance of `class`, created on first use.
    pub fn get_shared(&mut self, class: &str) -> Option<&mut (dyn Task + 'static)> {
        if !self.shared.contains_key(class) {
            let (_, factory) = self.factories.iter().find(|(c, _)| c == class)?;
            let task = factory();
            self.shared.insert(class.to_string(), task);
        }
        self.shared.get_mut(class).map(|task| task.as_mut())
    }

    /// Shared instance of `class`, if one was already created.
    pub fn get(&self, class: &str) -> Option<&(dyn Task + 'static)> {
        self.shared.get(class).map(|task| task.as_ref())
    }
}
