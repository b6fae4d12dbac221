//! routing::params
//!
//! Ordered parameter containers produced by the router.
//!
//! # Types
//!
//! - [`Params`] - Ordered map mixing positional and named entries
//! - [`ParamKey`] - Key of a single entry (index or name)
//! - [`Parts`] - Pre-decomposed input handed directly to the router
//!
//! # Ordering
//!
//! `Params` keeps insertion order. Positional entries carry their own index,
//! named entries carry a string key, and both live in the same sequence.
//! Merging follows the usual "append positionals, overwrite names" rule:
//! positional entries of the right-hand side are renumbered after the
//! left-hand side, named entries replace an existing value in place or are
//! appended.
//!
//! # Example
//!
//! ```
//! use phiz_cli::routing::Params;
//!
//! let positional = Params::explode(" title content", ' ');
//! let mut named = Params::new();
//! named.insert("year", "2010");
//!
//! let merged = positional.merge(named);
//! assert_eq!(merged.get(0), Some("title"));
//! assert_eq!(merged.get(1), Some("content"));
//! assert_eq!(merged.named("year"), Some("2010"));
//! ```

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Key of a single [`Params`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// Positional entry.
    Index(usize),
    /// Named entry.
    Name(String),
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKey::Index(i) => write!(f, "{}", i),
            ParamKey::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

/// Ordered map of positional and named parameter values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(ParamKey, String)>,
    next_index: usize,
}

impl Params {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a delimiter-prefixed string into positional params.
    ///
    /// The first character is dropped before splitting. An empty remainder
    /// yields an empty list.
    ///
    /// # Example
    ///
    /// ```
    /// use phiz_cli::routing::Params;
    ///
    /// let params = Params::explode("/a/b", '/');
    /// assert_eq!(params.positional().collect::<Vec<_>>(), vec!["a", "b"]);
    ///
    /// assert!(Params::explode(" ", ' ').is_empty());
    /// assert!(Params::explode("", ' ').is_empty());
    /// ```
    pub fn explode(raw: &str, delimiter: char) -> Self {
        let mut chars = raw.chars();
        chars.next();
        let rest = chars.as_str();
        if rest.is_empty() {
            return Self::new();
        }
        rest.split(delimiter).collect()
    }

    /// Append a positional value.
    pub fn push(&mut self, value: impl Into<String>) {
        let index = self.next_index;
        self.entries.push((ParamKey::Index(index), value.into()));
        self.next_index = index + 1;
    }

    /// Set a named value, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| matches!(key, ParamKey::Name(n) if *n == name))
        {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((ParamKey::Name(name), value)),
        }
    }

    /// Get a positional value by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.iter().find_map(|(key, value)| match key {
            ParamKey::Index(i) if *i == index => Some(value.as_str()),
            _ => None,
        })
    }

    /// Get a named value.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.entries.iter().find_map(|(key, value)| match key {
            ParamKey::Name(n) if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Get a value by key.
    pub fn get_key(&self, key: &ParamKey) -> Option<&str> {
        match key {
            ParamKey::Index(i) => self.get(*i),
            ParamKey::Name(n) => self.named(n),
        }
    }

    /// Number of entries (positional and named).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &str)> {
        self.entries.iter().map(|(key, value)| (key, value.as_str()))
    }

    /// Iterate over positional values in insertion order.
    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(key, value)| match key {
            ParamKey::Index(_) => Some(value.as_str()),
            ParamKey::Name(_) => None,
        })
    }

    /// Iterate over named entries in insertion order.
    pub fn named_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(key, value)| match key {
            ParamKey::Name(name) => Some((name.as_str(), value.as_str())),
            ParamKey::Index(_) => None,
        })
    }

    /// Merge `other` into `self`.
    ///
    /// Positional entries from `other` are appended and renumbered; named
    /// entries overwrite in place or are appended.
    pub fn merge(mut self, other: Params) -> Params {
        for (key, value) in other.entries {
            match key {
                ParamKey::Index(_) => self.push(value),
                ParamKey::Name(name) => self.insert(name, value),
            }
        }
        self
    }
}

impl<S: Into<String>> FromIterator<S> for Params {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut params = Params::new();
        for value in iter {
            params.push(value);
        }
        params
    }
}

impl<S: Into<String>> Extend<S> for Params {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

/// Purely positional params serialize as a sequence, anything else as a map
/// with stringified keys.
impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sequential = self
            .entries
            .iter()
            .enumerate()
            .all(|(pos, (key, _))| *key == ParamKey::Index(pos));

        if sequential {
            let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
            for (_, value) in &self.entries {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.entries.len()))?;
            for (key, value) in &self.entries {
                map.serialize_entry(&key.to_string(), value)?;
            }
            map.end()
        }
    }
}

/// The `params` part of a decomposition, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsPart {
    /// Delimiter-prefixed string still to be exploded.
    Raw(String),
    /// Already split.
    List(Params),
}

/// A decomposition of CLI input into module, task, action and params.
///
/// Passing `Parts` to [`Router::handle`](super::Router::handle) bypasses
/// pattern matching entirely. Entries in `extra` end up merged into the
/// resolved params.
///
/// # Example
///
/// ```
/// use phiz_cli::routing::Parts;
///
/// let parts = Parts::new().task("echo").action("hello").positional("world");
/// assert_eq!(parts.task.as_deref(), Some("echo"));
/// assert_eq!(parts.extra.get(0), Some("world"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parts {
    pub module: Option<String>,
    pub task: Option<String>,
    pub action: Option<String>,
    pub params: Option<ParamsPart>,
    /// Everything that is not one of the four well-known parts.
    pub extra: Params,
}

impl Parts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(ParamsPart::List(params));
        self
    }

    /// Set params as a delimiter-prefixed string (e.g. `" a b"`).
    pub fn raw_params(mut self, raw: impl Into<String>) -> Self {
        self.params = Some(ParamsPart::Raw(raw.into()));
        self
    }

    /// Add a named extra part.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name, value);
        self
    }

    /// Add a positional extra part.
    pub fn positional(mut self, value: impl Into<String>) -> Self {
        self.extra.push(value);
        self
    }

    /// Assign a part by its semantic name.
    pub fn set(&mut self, part: &str, value: impl Into<String>) {
        let value = value.into();
        match part {
            "module" => self.module = Some(value),
            "task" => self.task = Some(value),
            "action" => self.action = Some(value),
            "params" => self.params = Some(ParamsPart::Raw(value)),
            _ => self.extra.insert(part, value),
        }
    }
}
