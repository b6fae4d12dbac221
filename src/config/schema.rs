//! config::schema
//!
//! Route configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: the delimiter must be exactly one
//! character and every route needs a pattern that compiles under it. Path
//! tables may only hold strings (literal values) or non-negative integers
//! (capture positions), and shorthand paths must parse.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::routing::{PathValue, Params, RouteCompiler, RoutePaths, DEFAULT_DELIMITER};

/// Routing configuration.
///
/// # Example
///
/// ```toml
/// delimiter = " "
/// default_routes = true
///
/// [defaults]
/// task = "main"
/// action = "main"
///
/// [[routes]]
/// pattern = "posts ([0-9]{4}) :params"
/// name = "posts"
/// description = "Show posts by year"
/// paths = { task = "posts", action = "show", year = 1 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Token delimiter (default: a single space)
    pub delimiter: Option<String>,

    /// Whether the two built-in routes are installed (default: true)
    pub default_routes: Option<bool>,

    /// Fallbacks applied when nothing matches
    pub defaults: Option<DefaultsConfig>,

    /// Route table, in insertion order
    pub routes: Vec<RouteConfig>,
}

impl RoutesConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid, and
    /// `ConfigError::InvalidRoute` for a malformed shorthand or a pattern
    /// that does not compile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delimiter = match &self.delimiter {
            None => DEFAULT_DELIMITER,
            Some(delimiter) => {
                let mut chars = delimiter.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        return Err(ConfigError::InvalidValue(format!(
                            "delimiter must be a single character, got '{}'",
                            delimiter
                        )))
                    }
                }
            }
        };

        let compiler = RouteCompiler::with_delimiter(delimiter);
        for (index, route) in self.routes.iter().enumerate() {
            route.validate(index)?;
            route.route_paths(index)?;
            compiler
                .compile(&route.pattern)
                .map_err(|source| ConfigError::InvalidRoute {
                    index: index + 1,
                    source,
                })?;
        }

        Ok(())
    }
}

/// Fallback parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub module: Option<String>,
    pub task: Option<String>,
    pub action: Option<String>,
    pub params: Option<Vec<String>>,
}

impl DefaultsConfig {
    pub fn params(&self) -> Option<Params> {
        self.params
            .as_ref()
            .map(|values| values.iter().cloned().collect())
    }
}

/// One `[[routes]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RouteConfig {
    /// Route pattern
    pub pattern: String,

    /// Optional route name, used for lookups
    pub name: Option<String>,

    /// Shown by `phiz routes`
    pub description: Option<String>,

    /// Part mapping
    pub paths: Option<PathsConfig>,
}

impl RouteConfig {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.pattern.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "route #{} has an empty pattern",
                index + 1
            )));
        }
        if let Some(PathsConfig::Table(table)) = &self.paths {
            for (part, value) in table {
                path_value(part, value)?;
            }
        }
        Ok(())
    }

    /// The route's paths as [`RoutePaths`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for table entries that are
    /// neither strings nor non-negative integers, and
    /// `ConfigError::InvalidRoute` for a malformed shorthand.
    pub fn route_paths(&self, index: usize) -> Result<RoutePaths, ConfigError> {
        match &self.paths {
            None => Ok(RoutePaths::new()),
            Some(PathsConfig::Shorthand(shorthand)) => RoutePaths::parse(shorthand)
                .map_err(|source| ConfigError::InvalidRoute {
                    index: index + 1,
                    source,
                }),
            Some(PathsConfig::Table(table)) => {
                let mut paths = RoutePaths::new();
                for (part, value) in table {
                    paths.insert(part, path_value(part, value)?);
                }
                Ok(paths)
            }
        }
    }
}

/// Route paths: `"Module::Task::action"` or a table of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PathsConfig {
    Shorthand(String),
    Table(toml::Table),
}

fn path_value(part: &str, value: &toml::Value) -> Result<PathValue, ConfigError> {
    match value {
        toml::Value::String(literal) => Ok(PathValue::Literal(literal.clone())),
        toml::Value::Integer(position) => usize::try_from(*position)
            .map(PathValue::Position)
            .map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "path '{}' has a negative position {}",
                    part, position
                ))
            }),
        other => Err(ConfigError::InvalidValue(format!(
            "path '{}' must be a string or a position, got {}",
            part,
            other.type_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
            delimiter = "/"
            default_routes = false

            [defaults]
            task = "main"
            params = ["a"]

            [[routes]]
            pattern = "/posts/([0-9]{4})"
            name = "posts"
            paths = { task = "posts", action = "show", year = 1 }

            [[routes]]
            pattern = "/about"
            paths = "Pages::about"
        "#;
        let config: RoutesConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.delimiter.as_deref(), Some("/"));
        assert_eq!(config.default_routes, Some(false));
        assert_eq!(config.routes.len(), 2);
        assert_eq!(
            config.defaults.as_ref().and_then(DefaultsConfig::params),
            Some(["a"].into_iter().collect())
        );

        let paths = config.routes[0].route_paths(0).unwrap();
        let parts: Vec<_> = paths.iter().map(|(p, _)| p).collect();
        assert_eq!(parts, vec!["task", "action", "year"]);
        assert_eq!(paths.get("year"), Some(&PathValue::Position(1)));

        let shorthand = config.routes[1].route_paths(1).unwrap();
        assert_eq!(shorthand.get("task"), Some(&PathValue::literal("pages")));
    }

    #[test]
    fn empty_config_is_default() {
        let config: RoutesConfig = toml::from_str("").unwrap();
        assert_eq!(config, RoutesConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<RoutesConfig>("delimeter = \" \"").is_err());
        assert!(toml::from_str::<RoutesConfig>("[[routes]]\npatern = \"x\"").is_err());
    }

    #[test]
    fn multi_char_delimiter_rejected() {
        let config = RoutesConfig {
            delimiter: Some("::".into()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn bad_path_values_rejected() {
        let config: RoutesConfig =
            toml::from_str("[[routes]]\npattern = \"x\"\npaths = { task = true }").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let config: RoutesConfig =
            toml::from_str("[[routes]]\npattern = \"x\"\npaths = { task = -1 }").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn empty_pattern_rejected() {
        let config: RoutesConfig = toml::from_str("[[routes]]\nname = \"x\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn malformed_shorthand_fails_validation() {
        let config: RoutesConfig =
            toml::from_str("[[routes]]\npattern = \"x\"\npaths = \"nocolons\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRoute { index: 1, .. })
        ));
    }

    #[test]
    fn uncompilable_pattern_fails_validation() {
        let config: RoutesConfig = toml::from_str(
            "[[routes]]\npattern = \"ok\"\n\n[[routes]]\npattern = \"show {id:[0-9]+\"",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRoute { index: 2, .. })
        ));
    }

    #[test]
    fn malformed_shorthand() {
        let route = RouteConfig {
            pattern: "x".into(),
            paths: Some(PathsConfig::Shorthand("nocolons".into())),
            ..Default::default()
        };
        assert!(matches!(
            route.route_paths(0),
            Err(ConfigError::InvalidRoute { index: 1, .. })
        ));
    }
}
