//! console
//!
//! The CLI application: turns `argv` into router input, routes it, starts
//! the selected module and hands the result to the dispatcher.
//!
//! # Events
//!
//! | Event | Vetoable |
//! |---|---|
//! | `console:boot` | yes |
//! | `console:beforeStartModule` | yes |
//! | `console:afterStartModule` | yes |
//! | `console:beforeHandleTask` | yes |
//! | `console:afterHandleTask` | no |
//!
//! # Example
//!
//! ```
//! use phiz_cli::console::Console;
//! use phiz_cli::dispatch::{Dispatcher, FnTask, TaskRegistry};
//! use phiz_cli::routing::Router;
//! use serde_json::json;
//!
//! let mut tasks = TaskRegistry::new();
//! tasks.register("EchoTask", || {
//!     FnTask::new().method("helloAction", |ctx| Ok(json!(ctx.arg(0))))
//! });
//!
//! let mut console = Console::new(Router::new(true), Dispatcher::new(tasks));
//! let argv: Vec<String> = ["phiz", "echo", "hello", "world"].map(String::from).to_vec();
//! console.set_argument(&argv, true, true);
//!
//! let result = console.handle(None).unwrap();
//! assert_eq!(result, Some(json!("world")));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::dispatch::{DispatchError, Dispatcher, OptionValue, Options};
use crate::events::{vetoed, EventsManager};
use crate::routing::{Arguments, Parts, Router};

/// Errors from handling a console request.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Module '{0}' is not registered in the console container")]
    ModuleNotRegistered(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

type Bootstrap = Box<dyn Fn(&mut Dispatcher)>;

/// A module the router can select.
#[derive(Default)]
pub struct ModuleDefinition {
    namespace: Option<String>,
    bootstrap: Option<Bootstrap>,
}

impl std::fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("namespace", &self.namespace)
            .field("bootstrap", &self.bootstrap.is_some())
            .finish()
    }
}

impl ModuleDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler namespace used while the module is active.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Setup run the first time the module starts, typically registering
    /// its tasks.
    pub fn bootstrap(mut self, bootstrap: impl Fn(&mut Dispatcher) + 'static) -> Self {
        self.bootstrap = Some(Box::new(bootstrap));
        self
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// Split `argv` into positional words and options.
///
/// `--name=value` sets a value, `--flag` and `-f` set flags. A lone `-` is
/// positional.
///
/// # Example
///
/// ```
/// use phiz_cli::console::parse_argv;
///
/// let argv = ["echo", "--env=prod", "-v", "hi", "--dry-run"].map(String::from);
/// let (words, options) = parse_argv(&argv);
/// assert_eq!(words, vec!["echo", "hi"]);
/// assert_eq!(options.get("env").map(|o| o.as_str()), Some("prod"));
/// assert_eq!(options.get("v").map(|o| o.as_str()), Some("true"));
/// assert!(options.contains("dry-run"));
/// ```
pub fn parse_argv(argv: &[String]) -> (Vec<String>, Options) {
    let mut words = Vec::new();
    let mut options = Options::new();

    for arg in argv {
        if let Some(long) = arg.strip_prefix("--") {
            match long.split_once('=') {
                Some((name, value)) => options.insert(
                    name.trim(),
                    OptionValue::Value(value.trim().to_string()),
                ),
                None => options.insert(long.trim(), OptionValue::Flag),
            }
        } else if let Some(short) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
            options.insert(short, OptionValue::Flag);
        } else {
            words.push(arg.clone());
        }
    }

    (words, options)
}

/// Router input for positional words.
///
/// With `as_string` the words are joined with `delimiter`; otherwise the
/// first two become task and action and the rest positional params.
pub fn arguments_from_words(words: Vec<String>, as_string: bool, delimiter: char) -> Arguments {
    if as_string {
        return Arguments::Line(words.join(&delimiter.to_string()));
    }

    let mut words = words.into_iter();
    let mut parts = Parts::new();
    parts.task = words.next();
    parts.action = words.next();
    parts.extra.extend(words);
    Arguments::Parts(parts)
}

/// CLI application.
pub struct Console {
    router: Router,
    dispatcher: Dispatcher,
    events: Option<Arc<EventsManager>>,
    modules: Vec<(String, ModuleDefinition)>,
    started: HashSet<String>,
    default_module: Option<String>,
    arguments: Arguments,
    options: Options,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("router", &self.router)
            .field("dispatcher", &self.dispatcher)
            .field("modules", &self.modules)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .finish()
    }
}

impl Console {
    pub fn new(router: Router, dispatcher: Dispatcher) -> Self {
        Self {
            router,
            dispatcher,
            events: None,
            modules: Vec::new(),
            started: HashSet::new(),
            default_module: None,
            arguments: Arguments::Line(String::new()),
            options: Options::new(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Share an events manager with the dispatcher.
    pub fn set_events_manager(&mut self, events: Arc<EventsManager>) -> &mut Self {
        self.dispatcher.set_events_manager(Arc::clone(&events));
        self.events = Some(events);
        self
    }

    pub fn register_module(
        &mut self,
        name: impl Into<String>,
        definition: ModuleDefinition,
    ) -> &mut Self {
        let name = name.into();
        self.started.remove(&name);
        match self.modules.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = definition,
            None => self.modules.push((name, definition)),
        }
        self
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, definition)| definition)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|(n, _)| n.as_str())
    }

    /// Module started when the router selects none.
    pub fn set_default_module(&mut self, name: impl Into<String>) -> &mut Self {
        self.default_module = Some(name.into());
        self
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Store `argv` as router input.
    ///
    /// With `shift` the program name is dropped first. With `as_string` the
    /// positional words are joined with the route delimiter and matched
    /// against the routes; otherwise they become task, action and
    /// positional params directly.
    pub fn set_argument(&mut self, argv: &[String], as_string: bool, shift: bool) -> &mut Self {
        let argv = if shift && !argv.is_empty() {
            &argv[1..]
        } else {
            argv
        };
        let (words, options) = parse_argv(argv);
        self.options = options;

        self.arguments = arguments_from_words(words, as_string, self.router.delimiter());
        self
    }

    /// Route and dispatch. `arguments` overrides what
    /// [`Console::set_argument`] stored.
    ///
    /// Returns the action's value, or `None` if a listener stopped the
    /// request.
    ///
    /// # Errors
    ///
    /// Returns `ConsoleError::ModuleNotRegistered` for an unknown module
    /// and `ConsoleError::Dispatch` when dispatching fails.
    pub fn handle(&mut self, arguments: Option<Arguments>) -> Result<Option<Value>, ConsoleError> {
        let events = self.events.clone();
        let events = events.as_deref();

        if vetoed(events, "console:boot", Value::Null) {
            return Ok(None);
        }

        let arguments = arguments.unwrap_or_else(|| self.arguments.clone());
        self.router.handle(arguments);

        let module = match self.router.module_name() {
            "" => self.default_module.clone().unwrap_or_default(),
            name => name.to_string(),
        };

        let mut namespace = None;
        if !module.is_empty() {
            if vetoed(events, "console:beforeStartModule", json!(module)) {
                return Ok(None);
            }

            let definition = self
                .modules
                .iter()
                .find(|(n, _)| *n == module)
                .map(|(_, definition)| definition)
                .ok_or_else(|| ConsoleError::ModuleNotRegistered(module.clone()))?;

            if self.started.insert(module.clone()) {
                debug!(module = %module, "Starting module");
                if let Some(bootstrap) = &definition.bootstrap {
                    bootstrap(&mut self.dispatcher);
                }
            }
            namespace = definition.namespace.clone();

            if vetoed(events, "console:afterStartModule", json!(module)) {
                return Ok(None);
            }
        }

        self.dispatcher
            .set_namespace_name(namespace.unwrap_or_default())
            .set_module_name(module)
            .set_task_name(self.router.task_name())
            .set_action_name(self.router.action_name())
            .set_params(self.router.params().clone())
            .set_options(self.options.clone());

        if vetoed(events, "console:beforeHandleTask", Value::Null) {
            return Ok(None);
        }

        if !self.dispatcher.dispatch()? {
            return Ok(None);
        }

        let returned = self.dispatcher.returned_value().cloned();
        vetoed(
            events,
            "console:afterHandleTask",
            returned.clone().unwrap_or(Value::Null),
        );
        Ok(returned)
    }
}
