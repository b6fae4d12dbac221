//! config
//!
//! Route table configuration and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. The path given with `--config` (must exist)
//! 2. `$PHIZ_ROUTES` if set
//! 3. `$XDG_CONFIG_HOME/phiz/routes.toml`
//! 4. `~/.phiz/routes.toml`
//!
//! With no file found, defaults are used: a space delimiter, the two
//! built-in routes and no custom routes.
//!
//! # Example
//!
//! ```no_run
//! use phiz_cli::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let mut router = result.config.build_router().unwrap();
//! router.handle("echo hello");
//! println!("task: {}", router.task_name());
//! ```

pub mod schema;

pub use schema::{DefaultsConfig, PathsConfig, RouteConfig, RoutesConfig};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::routing::{RouteCompiler, RouteDefaults, RouteError, Router, DEFAULT_DELIMITER};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("invalid route #{index}: {source}")]
    InvalidRoute {
        index: usize,
        #[source]
        source: RouteError,
    },
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The file that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded routing configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub routes: RoutesConfig,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` does not exist, or if a config file
    /// exists but cannot be read, parsed or validated.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let candidates = search_paths(
            std::env::var("PHIZ_ROUTES").ok(),
            std::env::var("XDG_CONFIG_HOME").ok(),
            dirs::home_dir(),
        );
        match candidates.into_iter().find(|path| path.exists()) {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No route config found, using defaults");
                Ok(ConfigLoadResult {
                    config: Config::default(),
                    warnings: Vec::new(),
                })
            }
        }
    }

    /// Load and validate one config file.
    pub fn load_from(path: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let routes = Self::read_routes_config(path)?;
        routes.validate()?;
        debug!(path = %path.display(), routes = routes.routes.len(), "Loaded route config");

        let warnings = duplicate_names(&routes)
            .into_iter()
            .map(|name| ConfigWarning {
                message: format!(
                    "route name '{}' is used more than once; lookups by name return the first",
                    name
                ),
                path: path.to_path_buf(),
            })
            .collect();

        Ok(ConfigLoadResult {
            config: Config {
                routes,
                path: Some(path.to_path_buf()),
            },
            warnings,
        })
    }

    fn read_routes_config(path: &Path) -> Result<RoutesConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Token delimiter. Defaults to a space.
    pub fn delimiter(&self) -> char {
        self.routes
            .delimiter
            .as_deref()
            .and_then(|d| d.chars().next())
            .unwrap_or(DEFAULT_DELIMITER)
    }

    /// Whether the built-in routes are installed. Defaults to `true`.
    pub fn default_routes(&self) -> bool {
        self.routes.default_routes.unwrap_or(true)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Build a router with this configuration's delimiter, defaults and
    /// route table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRoute` if a route does not compile.
    pub fn build_router(&self) -> Result<Router, ConfigError> {
        let compiler = RouteCompiler::with_delimiter(self.delimiter());
        let mut router = Router::with_compiler(compiler, self.default_routes());

        if let Some(defaults) = &self.routes.defaults {
            router.set_defaults(RouteDefaults {
                module: defaults.module.clone(),
                task: defaults.task.clone(),
                action: defaults.action.clone(),
                params: defaults.params(),
            });
        }

        for (index, entry) in self.routes.routes.iter().enumerate() {
            let paths = entry.route_paths(index)?;
            let route = router
                .add(&entry.pattern, paths)
                .map_err(|source| ConfigError::InvalidRoute {
                    index: index + 1,
                    source,
                })?;
            if let Some(name) = &entry.name {
                route.set_name(name.as_str());
            }
            if let Some(description) = &entry.description {
                route.set_description(description.as_str());
            }
        }

        Ok(router)
    }
}

/// Default config locations, most specific first.
fn search_paths(
    phiz_routes: Option<String>,
    xdg_config_home: Option<String>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = phiz_routes {
        paths.push(PathBuf::from(path));
    }
    if let Some(xdg) = xdg_config_home {
        paths.push(PathBuf::from(xdg).join("phiz/routes.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".phiz/routes.toml"));
    }
    paths
}

fn duplicate_names(routes: &RoutesConfig) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in routes.routes.iter().filter_map(|r| r.name.as_deref()) {
        if !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("routes.toml");
        fs::write(&path, contents).unwrap();
        (temp, path)
    }

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.delimiter(), ' ');
        assert!(config.default_routes());
        assert!(config.loaded_from().is_none());

        let router = config.build_router().unwrap();
        assert_eq!(router.routes().len(), 2);
    }

    #[test]
    fn search_order() {
        let paths = search_paths(
            Some("/etc/phiz.toml".into()),
            Some("/xdg".into()),
            Some(PathBuf::from("/home/u")),
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/etc/phiz.toml"),
                PathBuf::from("/xdg/phiz/routes.toml"),
                PathBuf::from("/home/u/.phiz/routes.toml"),
            ]
        );
        assert!(search_paths(None, None, None).is_empty());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(&temp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn load_and_build() {
        let (_temp, path) = write_config(
            r#"
            default_routes = false

            [defaults]
            task = "help"

            [[routes]]
            pattern = "posts ([0-9]{4}) :params"
            name = "posts"
            description = "Show posts by year"
            paths = { task = "posts", action = "show", year = 1 }
            "#,
        );

        let result = Config::load(Some(&path)).unwrap();
        assert!(result.warnings.is_empty());
        assert_eq!(result.config.loaded_from(), Some(path.as_path()));

        let mut router = result.config.build_router().unwrap();
        assert_eq!(router.routes().len(), 1);
        let route = router.route_by_name("posts").unwrap();
        assert_eq!(route.description(), Some("Show posts by year"));

        router.handle("posts 2010 hello");
        assert!(router.was_matched());
        assert_eq!(router.params().named("year"), Some("2010"));

        router.handle("nothing here");
        assert!(!router.was_matched());
        assert_eq!(router.task_name(), "help");
    }

    #[test]
    fn custom_delimiter() {
        let (_temp, path) = write_config(
            r#"
            delimiter = "/"
            [[routes]]
            pattern = "/:task/:action/:params"
            "#,
        );

        let config = Config::load(Some(&path)).unwrap().config;
        assert_eq!(config.delimiter(), '/');

        let mut router = config.build_router().unwrap();
        router.handle("/echo/hello/a/b");
        assert_eq!(router.task_name(), "echo");
        assert_eq!(router.action_name(), "hello");
        assert_eq!(router.params().positional().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn parse_error_names_file() {
        let (_temp, path) = write_config("routes = 3");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("routes.toml"));
    }

    #[test]
    fn invalid_regex_is_route_error() {
        let (_temp, path) = write_config(
            r#"
            [[routes]]
            pattern = "broken ([0-9]"
            "#,
        );
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoute { index: 1, .. }));
        assert!(err.to_string().starts_with("invalid route #1"));
    }

    #[test]
    fn duplicate_names_warn() {
        let (_temp, path) = write_config(
            r#"
            [[routes]]
            pattern = "a"
            name = "dup"

            [[routes]]
            pattern = "b"
            name = "dup"

            [[routes]]
            pattern = "c"
            name = "dup"
            "#,
        );
        let result = Config::load(Some(&path)).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("'dup'"));
    }
}
