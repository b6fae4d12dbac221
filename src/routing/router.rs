//! routing::router
//!
//! Resolves CLI input into module, task, action and params.
//!
//! # Matching
//!
//! String input is tried against the routes in reverse insertion order, so
//! the most recently added route wins over earlier ones and over the two
//! built-in routes. A route matches when its compiled pattern matches and
//! its before-match predicate (if any) agrees. When nothing matches, the
//! configured defaults are applied and [`Router::was_matched`] is false.
//!
//! [`Parts`] input is taken as the decomposition itself; no pattern is
//! evaluated.
//!
//! # Built-in Routes
//!
//! `Router::new(true)` seeds, in order:
//! 1. `task` alone
//! 2. `task action [params...]`
//!
//! # Example
//!
//! ```
//! use phiz_cli::routing::{Router, RoutePaths};
//!
//! let mut router = Router::new(true);
//! router
//!     .add(
//!         "posts ([0-9]{4}) :params",
//!         RoutePaths::new()
//!             .literal("task", "posts")
//!             .literal("action", "show")
//!             .position("year", 1),
//!     )
//!     .unwrap();
//!
//! router.handle("posts 2010 hello");
//! assert!(router.was_matched());
//! assert_eq!(router.task_name(), "posts");
//! assert_eq!(router.params().get(0), Some("hello"));
//! assert_eq!(router.params().named("year"), Some("2010"));
//! ```

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use super::params::{Params, ParamsPart, Parts};
use super::pattern::{Captured, RouteCompiler};
use super::route::{IntoRoutePaths, PathValue, Route, RouteError, RoutePaths};

/// Matches a bare task name.
const TASK_ROUTE: &str = "#^(?::delimiter)?([a-zA-Z0-9_-]+)(?::delimiter)?$#";

/// Matches a task, an action and optional trailing params.
const TASK_ACTION_ROUTE: &str =
    "#^(?::delimiter)?([a-zA-Z0-9_-]+):delimiter([a-zA-Z0-9._]+)(:delimiter.*)*$#";

/// Errors from the router.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("Arguments must be an array or string, got {0}")]
    InvalidArguments(&'static str),

    #[error("part '{part}' must be a scalar value")]
    InvalidPart { part: String },

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Input accepted by [`Router::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    /// Delimiter-separated tokens, matched against the routes.
    Line(String),
    /// Already decomposed input.
    Parts(Parts),
}

impl From<&str> for Arguments {
    fn from(line: &str) -> Self {
        Arguments::Line(line.to_string())
    }
}

impl From<String> for Arguments {
    fn from(line: String) -> Self {
        Arguments::Line(line)
    }
}

impl From<Option<String>> for Arguments {
    fn from(line: Option<String>) -> Self {
        Arguments::Line(line.unwrap_or_default())
    }
}

impl From<Parts> for Arguments {
    fn from(parts: Parts) -> Self {
        Arguments::Parts(parts)
    }
}

/// Fallback values for the resolved parts.
///
/// With [`Router::set_defaults`], only the fields that are `Some` are
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDefaults {
    pub module: Option<String>,
    pub task: Option<String>,
    pub action: Option<String>,
    pub params: Option<Params>,
}

/// A route that matched string input, before it is applied.
struct LineMatch {
    index: usize,
    parts: Parts,
    groups: Option<Vec<String>>,
}

/// CLI argument router.
#[derive(Debug)]
pub struct Router {
    compiler: RouteCompiler,
    routes: Vec<Route>,

    matched_route: Option<usize>,
    matches: Option<Vec<String>>,
    was_matched: bool,

    module: String,
    task: String,
    action: String,
    params: Params,

    default_module: Option<String>,
    default_task: Option<String>,
    default_action: Option<String>,
    default_params: Params,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Router {
    /// Create a router with its own compilation context.
    pub fn new(default_routes: bool) -> Self {
        Self::with_compiler(RouteCompiler::new(), default_routes)
    }

    /// Create a router using `compiler` for ids and delimiter.
    pub fn with_compiler(compiler: RouteCompiler, default_routes: bool) -> Self {
        let mut router = Self {
            compiler,
            routes: Vec::new(),
            matched_route: None,
            matches: None,
            was_matched: false,
            module: String::new(),
            task: String::new(),
            action: String::new(),
            params: Params::new(),
            default_module: None,
            default_task: None,
            default_action: None,
            default_params: Params::new(),
        };

        if default_routes {
            router.add_builtin(TASK_ROUTE, RoutePaths::new().position("task", 1));
            router.add_builtin(
                TASK_ACTION_ROUTE,
                RoutePaths::new()
                    .position("task", 1)
                    .position("action", 2)
                    .position("params", 3),
            );
        }

        router
    }

    fn add_builtin(&mut self, pattern: &str, paths: RoutePaths) {
        // Both patterns are raw regexes with the delimiter escaped in.
        let route = Route::new(&self.compiler, pattern, paths)
            .expect("built-in route patterns are valid");
        self.routes.push(route);
    }

    /// Add a route and return it for further configuration.
    ///
    /// Duplicate patterns are allowed; the later route is tried first.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` if the paths or the pattern are invalid.
    pub fn add(
        &mut self,
        pattern: &str,
        paths: impl IntoRoutePaths,
    ) -> Result<&mut Route, RouteError> {
        let route = Route::new(&self.compiler, pattern, paths)?;
        debug!(id = route.id(), pattern, "route added");
        self.routes.push(route);
        let last = self.routes.len() - 1;
        Ok(&mut self.routes[last])
    }

    /// Resolve `arguments`, overwriting the previous result.
    pub fn handle(&mut self, arguments: impl Into<Arguments>) {
        self.was_matched = false;
        self.matched_route = None;
        self.matches = None;

        let parts = match arguments.into() {
            Arguments::Parts(parts) => parts,
            Arguments::Line(line) => match self.match_line(&line) {
                Some(found) => {
                    self.was_matched = true;
                    self.matched_route = Some(found.index);
                    self.matches = found.groups;
                    found.parts
                }
                None => {
                    debug!(input = %line, "no route matched, using defaults");
                    self.apply_defaults();
                    return;
                }
            },
        };

        self.resolve(parts);
    }

    /// Resolve loosely typed input.
    ///
    /// Objects and arrays are taken as parts, strings and `null` are
    /// matched against the routes.
    ///
    /// # Errors
    ///
    /// Returns `RouterError::InvalidArguments` for numbers and booleans and
    /// `RouterError::InvalidPart` for nested values outside `params`.
    pub fn handle_value(&mut self, arguments: Value) -> Result<(), RouterError> {
        let arguments = match arguments {
            Value::Null => Arguments::Line(String::new()),
            Value::String(line) => Arguments::Line(line),
            Value::Array(items) => {
                let mut parts = Parts::new();
                for item in items {
                    parts.extra.push(scalar(&item, "params")?);
                }
                Arguments::Parts(parts)
            }
            Value::Object(map) => {
                let mut parts = Parts::new();
                for (part, value) in map {
                    match value {
                        Value::Null => {}
                        Value::Array(items) if part == "params" => {
                            let list = items
                                .iter()
                                .map(|item| scalar(item, &part))
                                .collect::<Result<Params, _>>()?;
                            parts.params = Some(ParamsPart::List(list));
                        }
                        other => {
                            let text = scalar(&other, &part)?;
                            parts.set(&part, text);
                        }
                    }
                }
                Arguments::Parts(parts)
            }
            Value::Bool(_) => return Err(RouterError::InvalidArguments("boolean")),
            Value::Number(_) => return Err(RouterError::InvalidArguments("number")),
        };

        self.handle(arguments);
        Ok(())
    }

    /// Find the first route (newest first) accepting `line`.
    fn match_line(&self, line: &str) -> Option<LineMatch> {
        for (index, route) in self.routes.iter().enumerate().rev() {
            let Some(captured) = route.compiled_pattern().captures(line) else {
                continue;
            };

            if let Some(predicate) = route.get_before_match() {
                if !predicate(line, route, self) {
                    trace!(id = route.id(), "before-match vetoed route");
                    continue;
                }
            }

            debug!(id = route.id(), pattern = %route.compiled_pattern(), "route matched");
            let parts = extract_parts(route, &captured);
            return Some(LineMatch {
                index,
                parts,
                groups: captured.into_groups(),
            });
        }
        None
    }

    fn resolve(&mut self, parts: Parts) {
        let Parts {
            module,
            task,
            action,
            params,
            extra,
        } = parts;

        self.module = module
            .or_else(|| self.default_module.clone())
            .unwrap_or_default();
        self.task = task
            .or_else(|| self.default_task.clone())
            .unwrap_or_default();
        self.action = action
            .or_else(|| self.default_action.clone())
            .unwrap_or_default();

        let params = match params {
            Some(ParamsPart::List(list)) => list,
            Some(ParamsPart::Raw(raw)) => Params::explode(&raw, self.compiler.delimiter()),
            None => self.default_params.clone(),
        };
        self.params = if params.is_empty() {
            extra
        } else {
            params.merge(extra)
        };
    }

    fn apply_defaults(&mut self) {
        self.module = self.default_module.clone().unwrap_or_default();
        self.task = self.default_task.clone().unwrap_or_default();
        self.action = self.default_action.clone().unwrap_or_default();
        self.params = self.default_params.clone();
    }

    // =========================================================================
    // Resolved state
    // =========================================================================

    pub fn module_name(&self) -> &str {
        &self.module
    }

    pub fn task_name(&self) -> &str {
        &self.task
    }

    pub fn action_name(&self) -> &str {
        &self.action
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Raw groups of the last regex match (index 0 is the whole input).
    pub fn matches(&self) -> Option<&[String]> {
        self.matches.as_deref()
    }

    pub fn matched_route(&self) -> Option<&Route> {
        self.matched_route.map(|index| &self.routes[index])
    }

    pub fn was_matched(&self) -> bool {
        self.was_matched
    }

    // =========================================================================
    // Routes
    // =========================================================================

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route_by_id(&self, id: usize) -> Option<&Route> {
        self.routes.iter().find(|route| route.id() == id)
    }

    pub fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name() == Some(name))
    }

    /// The active delimiter.
    pub fn delimiter(&self) -> char {
        self.compiler.delimiter()
    }

    /// Change the delimiter for routes added from now on and for params
    /// splitting. Existing routes keep their compiled patterns.
    pub fn set_delimiter(&mut self, delimiter: char) {
        self.compiler.set_delimiter(delimiter);
    }

    pub fn compiler(&self) -> &RouteCompiler {
        &self.compiler
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    pub fn set_default_module(&mut self, module: impl Into<String>) -> &mut Self {
        self.default_module = Some(module.into());
        self
    }

    pub fn set_default_task(&mut self, task: impl Into<String>) -> &mut Self {
        self.default_task = Some(task.into());
        self
    }

    pub fn set_default_action(&mut self, action: impl Into<String>) -> &mut Self {
        self.default_action = Some(action.into());
        self
    }

    pub fn set_default_params(&mut self, params: Params) -> &mut Self {
        self.default_params = params;
        self
    }

    /// Apply every default that is set in `defaults`, leaving the others.
    pub fn set_defaults(&mut self, defaults: RouteDefaults) -> &mut Self {
        if let Some(module) = defaults.module {
            self.default_module = Some(module);
        }
        if let Some(task) = defaults.task {
            self.default_task = Some(task);
        }
        if let Some(action) = defaults.action {
            self.default_action = Some(action);
        }
        if let Some(params) = defaults.params {
            self.default_params = params;
        }
        self
    }

    pub fn defaults(&self) -> RouteDefaults {
        RouteDefaults {
            module: self.default_module.clone(),
            task: self.default_task.clone(),
            action: self.default_action.clone(),
            params: Some(self.default_params.clone()),
        }
    }
}

/// Build parts from a route's paths and the groups it captured.
///
/// A captured value goes through the part's converter if there is one. When
/// nothing was captured for a part, its converter (if any) receives the raw
/// path value instead; otherwise literals are kept and unmatched positions
/// are left out. An unmatched `params` position yields an empty list so the
/// default params only apply when a route has no `params` path at all.
fn extract_parts(route: &Route, captured: &Captured) -> Parts {
    let mut parts = Parts::new();
    for (part, value) in route.paths().iter() {
        let group = match value {
            PathValue::Position(position) => captured.group(*position),
            PathValue::Literal(_) => None,
        };
        match (group, route.converter(part)) {
            (Some(raw), Some(convert)) => parts.set(part, convert(raw)),
            (Some(raw), None) => parts.set(part, raw),
            (None, Some(convert)) => parts.set(part, convert(&value.raw())),
            (None, None) => match value {
                PathValue::Literal(literal) => parts.set(part, literal.clone()),
                PathValue::Position(_) if part == "params" => {
                    parts.params = Some(ParamsPart::List(Params::new()));
                }
                PathValue::Position(_) => {}
            },
        }
    }
    parts
}

fn scalar(value: &Value, part: &str) -> Result<String, RouterError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if *b { "1" } else { "" }.to_string()),
        _ => Err(RouterError::InvalidPart {
            part: part.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_routes_seeded_in_order() {
        let router = Router::new(true);
        let routes = router.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].paths().get("task"), Some(&PathValue::Position(1)));
        assert_eq!(routes[1].paths().get("params"), Some(&PathValue::Position(3)));
        assert!(Router::new(false).routes().is_empty());
    }

    #[test]
    fn bare_task() {
        let mut router = Router::new(true);
        router.handle("echo");
        assert!(router.was_matched());
        assert_eq!(router.task_name(), "echo");
        assert_eq!(router.action_name(), "");
        assert!(router.params().is_empty());
    }

    #[test]
    fn task_action_params() {
        let mut router = Router::new(true);
        router.handle("echo hello a b");
        assert_eq!(router.task_name(), "echo");
        assert_eq!(router.action_name(), "hello");
        assert_eq!(
            router.params().positional().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(
            router.matches(),
            Some(&["echo hello a b".to_string(), "echo".into(), "hello".into(), " a b".into()][..])
        );
    }

    #[test]
    fn unmatched_params_position_ignores_default_params() {
        let mut router = Router::new(true);
        router.set_default_params(["p"].into_iter().collect());

        router.handle("echo hello");
        assert!(router.was_matched());
        assert_eq!(router.action_name(), "hello");
        assert!(router.params().is_empty());

        router.handle("!!!");
        assert!(!router.was_matched());
        assert_eq!(router.params().get(0), Some("p"));
    }

    #[test]
    fn empty_string_falls_back_to_defaults() {
        let mut router = Router::new(true);
        router.handle("");
        assert!(!router.was_matched());
        assert_eq!(router.task_name(), "");
        assert!(router.matched_route().is_none());
    }

    #[test]
    fn none_treated_as_empty_string() {
        let mut router = Router::new(true);
        router.set_default_task("main");
        router.handle(None::<String>);
        assert!(!router.was_matched());
        assert_eq!(router.task_name(), "main");
    }

    #[test]
    fn parts_bypass_matching() {
        let mut router = Router::new(true);
        router.handle(Parts::new().task("echo"));
        assert_eq!(router.task_name(), "echo");
        assert!(!router.was_matched());
        assert!(router.matched_route().is_none());
    }

    #[test]
    fn parts_missing_keys_take_defaults() {
        let mut router = Router::new(true);
        router.set_defaults(RouteDefaults {
            task: Some("X".into()),
            ..Default::default()
        });
        router.handle(Parts::new());
        assert_eq!(router.task_name(), "X");
    }

    #[test]
    fn set_defaults_applies_params() {
        let mut router = Router::new(true);
        router.set_defaults(RouteDefaults {
            params: Some(["p"].into_iter().collect()),
            ..Default::default()
        });
        router.handle("");
        assert_eq!(router.params().get(0), Some("p"));

        router.handle(Parts::new().task("t"));
        assert_eq!(router.params().get(0), Some("p"));
    }

    #[test]
    fn set_defaults_leaves_unset_keys() {
        let mut router = Router::new(true);
        router.set_default_task("main").set_default_action("run");
        router.set_defaults(RouteDefaults {
            action: Some("other".into()),
            ..Default::default()
        });
        let defaults = router.defaults();
        assert_eq!(defaults.task.as_deref(), Some("main"));
        assert_eq!(defaults.action.as_deref(), Some("other"));
    }

    #[test]
    fn before_match_veto_continues_search() {
        let mut router = Router::new(false);
        router.add("go", "First::a").unwrap();
        router
            .add("go", "Second::b")
            .unwrap()
            .before_match(|_, _, _| false);

        router.handle("go");
        assert!(router.was_matched());
        assert_eq!(router.task_name(), "first");
    }

    #[test]
    fn before_match_sees_router_and_route() {
        let mut router = Router::new(false);
        router
            .add("go", "Only::a")
            .unwrap()
            .set_name("only")
            .before_match(|input, route, router| {
                input == "go" && route.name() == Some("only") && router.routes().len() == 1
            });

        router.handle("go");
        assert!(router.was_matched());
    }

    #[test]
    fn converter_applied_to_capture() {
        let mut router = Router::new(false);
        router
            .add("run {name}", RoutePaths::new().literal("task", "run"))
            .unwrap()
            .convert("name", |v| v.to_uppercase());

        router.handle("run abc");
        assert_eq!(router.params().named("name"), Some("ABC"));
    }

    #[test]
    fn converter_receives_raw_value_when_unmatched() {
        let mut router = Router::new(false);
        router
            .add(
                "list( [a-z]+)?",
                RoutePaths::new()
                    .literal("task", "list")
                    .position("filter", 1),
            )
            .unwrap()
            .convert("filter", |v| format!("<{}>", v));

        router.handle("list");
        assert_eq!(router.params().named("filter"), Some("<1>"));
    }

    #[test]
    fn converter_applied_to_literal() {
        let mut router = Router::new(false);
        router
            .add("x", "Posts::show")
            .unwrap()
            .convert("action", |v| format!("{}_all", v));

        router.handle("x");
        assert_eq!(router.action_name(), "show_all");
    }

    #[test]
    fn unmatched_position_without_converter_is_omitted() {
        let mut router = Router::new(false);
        router
            .add(
                "list( [a-z]+)?",
                RoutePaths::new()
                    .literal("task", "list")
                    .position("filter", 1),
            )
            .unwrap();

        router.handle("list");
        assert!(router.params().is_empty());
    }

    #[test]
    fn literal_route_has_no_matches() {
        let mut router = Router::new(false);
        router.add("very static route", "Static::run").unwrap();
        router.handle("very static route");
        assert!(router.was_matched());
        assert!(router.matches().is_none());
    }

    #[test]
    fn handle_overwrites_previous_state() {
        let mut router = Router::new(true);
        router.handle("echo hello a");
        router.handle("");
        assert_eq!(router.task_name(), "");
        assert!(router.params().is_empty());
        assert!(router.matches().is_none());
    }

    #[test]
    fn handle_value_object() {
        let mut router = Router::new(true);
        router
            .handle_value(json!({"task": "echo", "params": ["a", 1], "id": 7}))
            .unwrap();
        assert_eq!(router.task_name(), "echo");
        assert_eq!(router.params().get(1), Some("1"));
        assert_eq!(router.params().named("id"), Some("7"));
    }

    #[test]
    fn handle_value_string_and_null() {
        let mut router = Router::new(true);
        router.handle_value(json!("echo hi")).unwrap();
        assert_eq!(router.action_name(), "hi");
        router.handle_value(Value::Null).unwrap();
        assert!(!router.was_matched());
    }

    #[test]
    fn handle_value_rejects_scalars() {
        let mut router = Router::new(true);
        assert_eq!(
            router.handle_value(json!(42)),
            Err(RouterError::InvalidArguments("number"))
        );
        assert_eq!(
            router.handle_value(json!(true)),
            Err(RouterError::InvalidArguments("boolean"))
        );
    }

    #[test]
    fn handle_value_rejects_nested_parts() {
        let mut router = Router::new(true);
        assert_eq!(
            router.handle_value(json!({"task": ["a"]})),
            Err(RouterError::InvalidPart {
                part: "task".into()
            })
        );
    }

    #[test]
    fn lookup_by_id_and_name() {
        let mut router = Router::new(true);
        let id = router.add("a", "A::b").unwrap().set_name("a-route").id();
        assert_eq!(router.route_by_id(id).map(Route::pattern), Some("a"));
        assert_eq!(router.route_by_name("a-route").map(Route::id), Some(id));
        assert!(router.route_by_name("missing").is_none());
        assert!(router.route_by_id(999).is_none());
    }

    #[test]
    fn params_split_on_router_delimiter() {
        let mut router = Router::new(false);
        router.set_delimiter('/');
        router.add("/:task/:action/:params", RoutePaths::new()).unwrap();
        router.handle("/echo/hi/a/b");
        assert_eq!(router.task_name(), "echo");
        assert_eq!(router.action_name(), "hi");
        assert_eq!(
            router.params().positional().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }
}
