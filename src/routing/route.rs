//! routing::route
//!
//! A single route: compiled pattern plus the mapping from semantic parts to
//! literal values or capture positions.
//!
//! # Paths
//!
//! Paths map a part name (`module`, `task`, `action`, `params` or any custom
//! key) to either a literal value or a 1-based capture group index. They can
//! be given as a [`RoutePaths`] value or in shorthand:
//!
//! - `"Task::action"` - task and action
//! - `"Module::Task::action"` - module, task and action
//!
//! A namespace prefix on the task (`App\Tasks\EchoTask`) is dropped and the
//! class name uncamelized (`echo_task`).
//!
//! # Example
//!
//! ```
//! use phiz_cli::routing::{PathValue, RouteCompiler, RoutePaths, Route};
//!
//! let compiler = RouteCompiler::new();
//! let route = Route::new(&compiler, "show {id:[0-9]+}", "Posts::show").unwrap();
//!
//! assert_eq!(route.paths().get("task"), Some(&PathValue::literal("posts")));
//! assert_eq!(route.paths().get("id"), Some(&PathValue::Position(1)));
//! ```

use std::sync::Arc;

use thiserror::Error;

use super::pattern::{CompiledPattern, RouteCompiler};
use super::router::Router;
use crate::naming::uncamelize;

/// Errors from route construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("the route contains invalid paths: '{0}'")]
    InvalidPaths(String),

    #[error("invalid route pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Transforms a raw part value before it is exposed.
pub type Converter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Predicate that can veto a pattern match: `(input, route, router)`.
pub type BeforeMatch = Arc<dyn Fn(&str, &Route, &Router) -> bool + Send + Sync>;

/// Target of a single path entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathValue {
    /// Fixed value.
    Literal(String),
    /// 1-based capture group index.
    Position(usize),
}

impl PathValue {
    pub fn literal(value: impl Into<String>) -> Self {
        PathValue::Literal(value.into())
    }

    /// Text handed to a converter when nothing was captured for this part.
    pub fn raw(&self) -> String {
        match self {
            PathValue::Literal(value) => value.clone(),
            PathValue::Position(position) => position.to_string(),
        }
    }
}

impl std::fmt::Display for PathValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathValue::Literal(value) => write!(f, "{:?}", value),
            PathValue::Position(position) => write!(f, "${}", position),
        }
    }
}

/// Ordered mapping from part names to path values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePaths {
    entries: Vec<(String, PathValue)>,
}

impl RoutePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse shorthand paths.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::InvalidPaths` when a non-empty string has no
    /// `::` separator or more than three segments.
    ///
    /// # Example
    ///
    /// ```
    /// use phiz_cli::routing::{PathValue, RoutePaths};
    ///
    /// let paths = RoutePaths::parse("Admin::Users::list").unwrap();
    /// assert_eq!(paths.get("module"), Some(&PathValue::literal("Admin")));
    /// assert_eq!(paths.get("task"), Some(&PathValue::literal("users")));
    /// assert_eq!(paths.get("action"), Some(&PathValue::literal("list")));
    ///
    /// assert!(RoutePaths::parse("NoSeparator").is_err());
    /// ```
    pub fn parse(shorthand: &str) -> Result<Self, RouteError> {
        if shorthand.is_empty() {
            return Ok(Self::new());
        }

        let segments: Vec<&str> = shorthand.split("::").collect();
        let (module, task, action) = match segments.as_slice() {
            [task, action] => (None, *task, *action),
            [module, task, action] => (Some(*module), *task, *action),
            _ => return Err(RouteError::InvalidPaths(shorthand.to_string())),
        };

        let mut paths = Self::new();
        if let Some(module) = module {
            paths.insert("module", PathValue::literal(module));
        }
        let class = task.rsplit('\\').next().unwrap_or(task);
        paths.insert("task", PathValue::literal(uncamelize(class)));
        paths.insert("action", PathValue::literal(action));
        Ok(paths)
    }

    /// Builder: map `part` to a literal value.
    pub fn literal(mut self, part: &str, value: impl Into<String>) -> Self {
        self.insert(part, PathValue::literal(value));
        self
    }

    /// Builder: map `part` to a capture group.
    pub fn position(mut self, part: &str, position: usize) -> Self {
        self.insert(part, PathValue::Position(position));
        self
    }

    /// Set `part`, replacing an existing entry in place.
    pub fn insert(&mut self, part: impl AsRef<str>, value: PathValue) {
        let part = part.as_ref();
        match self.entries.iter_mut().find(|(name, _)| name == part) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((part.to_string(), value)),
        }
    }

    pub fn get(&self, part: &str) -> Option<&PathValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == part)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, part: &str) -> bool {
        self.get(part).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Conversion into route paths, accepting shorthand strings.
pub trait IntoRoutePaths {
    fn into_route_paths(self) -> Result<RoutePaths, RouteError>;
}

impl IntoRoutePaths for RoutePaths {
    fn into_route_paths(self) -> Result<RoutePaths, RouteError> {
        Ok(self)
    }
}

impl IntoRoutePaths for &str {
    fn into_route_paths(self) -> Result<RoutePaths, RouteError> {
        RoutePaths::parse(self)
    }
}

impl IntoRoutePaths for String {
    fn into_route_paths(self) -> Result<RoutePaths, RouteError> {
        RoutePaths::parse(&self)
    }
}

impl IntoRoutePaths for Option<RoutePaths> {
    fn into_route_paths(self) -> Result<RoutePaths, RouteError> {
        Ok(self.unwrap_or_default())
    }
}

/// A compiled route.
#[derive(Clone)]
pub struct Route {
    id: usize,
    name: Option<String>,
    description: Option<String>,
    pattern: String,
    compiled: CompiledPattern,
    paths: RoutePaths,
    converters: Vec<(String, Converter)>,
    before_match: Option<BeforeMatch>,
}

impl Route {
    /// Compile a route with the next id from `compiler`.
    ///
    /// Positions of `{name}` tokens override same-named paths; positions of
    /// `:task`-style placeholders only fill parts the paths leave unset.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` if the paths or the pattern are invalid.
    pub fn new(
        compiler: &RouteCompiler,
        pattern: &str,
        paths: impl IntoRoutePaths,
    ) -> Result<Self, RouteError> {
        let id = compiler.next_id();
        let mut paths = paths.into_route_paths()?;
        let compiled = compiler.compile(pattern)?;

        for (part, position) in compiled.placeholders {
            if !paths.contains(&part) {
                paths.insert(&part, PathValue::Position(position));
            }
        }
        for (part, position) in compiled.positions {
            paths.insert(&part, PathValue::Position(position));
        }

        Ok(Self {
            id,
            name: None,
            description: None,
            pattern: pattern.to_string(),
            compiled: compiled.pattern,
            paths,
            converters: Vec::new(),
            before_match: None,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// The pattern as supplied.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn compiled_pattern(&self) -> &CompiledPattern {
        &self.compiled
    }

    pub fn paths(&self) -> &RoutePaths {
        &self.paths
    }

    /// Replace the paths wholesale.
    pub fn set_paths(&mut self, paths: impl IntoRoutePaths) -> Result<&mut Self, RouteError> {
        self.paths = paths.into_route_paths()?;
        Ok(self)
    }

    /// Register a converter for `part`, replacing any previous one.
    pub fn convert(
        &mut self,
        part: impl Into<String>,
        converter: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> &mut Self {
        let part = part.into();
        self.converters.retain(|(name, _)| *name != part);
        self.converters.push((part, Arc::new(converter)));
        self
    }

    pub fn converter(&self, part: &str) -> Option<&Converter> {
        self.converters
            .iter()
            .find(|(name, _)| name == part)
            .map(|(_, converter)| converter)
    }

    pub fn converters(&self) -> impl Iterator<Item = (&str, &Converter)> {
        self.converters
            .iter()
            .map(|(name, converter)| (name.as_str(), converter))
    }

    pub fn before_match(
        &mut self,
        predicate: impl Fn(&str, &Route, &Router) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_match = Some(Arc::new(predicate));
        self
    }

    pub fn get_before_match(&self) -> Option<&BeforeMatch> {
        self.before_match.as_ref()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("compiled", &self.compiled.as_str())
            .field("paths", &self.paths)
            .field(
                "converters",
                &self.converters.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("before_match", &self.before_match.is_some())
            .finish()
    }
}
