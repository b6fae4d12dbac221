//! dispatch::options
//!
//! Named CLI switches (`--name=value`, `--flag`, `-f`).

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::routing::Params;

/// Value of a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Switch given without a value.
    Flag,
    /// `--name=value`
    Value(String),
}

impl OptionValue {
    /// Text form; flags read as `"true"`.
    pub fn as_str(&self) -> &str {
        match self {
            OptionValue::Flag => "true",
            OptionValue::Value(value) => value,
        }
    }
}

/// Ordered option map. Later occurrences overwrite earlier ones in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: Vec<(String, OptionValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(n, value)| (n.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options as named params, in order.
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        for (name, value) in &self.entries {
            params.insert(name.as_str(), value.as_str());
        }
        params
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            match value {
                OptionValue::Flag => map.serialize_entry(name, &true)?,
                OptionValue::Value(v) => map.serialize_entry(name, v)?,
            }
        }
        map.end()
    }
}
