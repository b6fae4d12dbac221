//! dispatch::filter
//!
//! Named sanitizers applied to option values.
//!
//! # Built-in Sanitizers
//!
//! | Name | Effect |
//! |---|---|
//! | `trim` | Strip surrounding whitespace |
//! | `lower` / `upper` | Change case |
//! | `int` | Keep digits, `+` and `-` |
//! | `absint` | Absolute integer value of the leading number, `0` if none |
//! | `float` | Keep digits, `+`, `-`, `.`, `e` and `E` |
//! | `alnum` / `alpha` / `digit` | Keep only that character class |
//! | `string` / `striptags` | Remove `<...>` tags |
//! | `email` | Keep characters valid in an address |
//!
//! Custom sanitizers can be registered with [`Filter::add`].

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

/// Errors from sanitizing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("sanitizer '{0}' is not registered")]
    UnknownSanitizer(String),
}

type Sanitizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Registry of named sanitizers.
#[derive(Clone, Default)]
pub struct Filter {
    custom: HashMap<String, Sanitizer>,
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("Filter").field("custom", &names).finish()
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sanitizer. Custom sanitizers shadow built-ins.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        sanitizer: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> &mut Self {
        self.custom.insert(name.into(), Arc::new(sanitizer));
        self
    }

    /// Apply one sanitizer.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::UnknownSanitizer` for unregistered names.
    ///
    /// # Example
    ///
    /// ```
    /// use phiz_cli::dispatch::Filter;
    ///
    /// let filter = Filter::new();
    /// assert_eq!(filter.sanitize(" 42abc ", "int").unwrap(), "42");
    /// assert_eq!(filter.sanitize("-17 apples", "absint").unwrap(), "17");
    /// assert!(filter.sanitize("x", "nope").is_err());
    /// ```
    pub fn sanitize(&self, value: &str, name: &str) -> Result<String, FilterError> {
        if let Some(custom) = self.custom.get(name) {
            return Ok(custom(value));
        }

        let sanitized = match name {
            "trim" => value.trim().to_string(),
            "lower" => value.to_lowercase(),
            "upper" => value.to_uppercase(),
            "int" => keep(value, |c| c.is_ascii_digit() || c == '+' || c == '-'),
            "absint" => absint(value),
            "float" => keep(value, |c| {
                c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')
            }),
            "alnum" => keep(value, |c| c.is_alphanumeric()),
            "alpha" => keep(value, |c| c.is_alphabetic()),
            "digit" => keep(value, |c| c.is_ascii_digit()),
            "string" | "striptags" => strip_tags(value),
            "email" => keep(value, |c| {
                c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(c)
            }),
            other => return Err(FilterError::UnknownSanitizer(other.to_string())),
        };
        Ok(sanitized)
    }

    /// Apply sanitizers in order.
    pub fn sanitize_all(&self, value: &str, names: &[&str]) -> Result<String, FilterError> {
        names
            .iter()
            .try_fold(value.to_string(), |acc, name| self.sanitize(&acc, name))
    }
}

fn keep(value: &str, allowed: impl Fn(char) -> bool) -> String {
    value.chars().filter(|c| allowed(*c)).collect()
}

fn absint(value: &str) -> String {
    let trimmed = value.trim_start();
    let unsigned = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        "0".to_string()
    } else {
        digits.to_string()
    }
}

fn strip_tags(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for c in value.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins() {
        let filter = Filter::new();
        assert_eq!(filter.sanitize("  a b ", "trim").unwrap(), "a b");
        assert_eq!(filter.sanitize("AbC", "lower").unwrap(), "abc");
        assert_eq!(filter.sanitize("AbC", "upper").unwrap(), "ABC");
        assert_eq!(filter.sanitize("a-1b2", "int").unwrap(), "-12");
        assert_eq!(filter.sanitize("1.5e3x", "float").unwrap(), "1.5e3");
        assert_eq!(filter.sanitize("a-b_c1", "alnum").unwrap(), "abc1");
        assert_eq!(filter.sanitize("a1b2", "alpha").unwrap(), "ab");
        assert_eq!(filter.sanitize("a1b2", "digit").unwrap(), "12");
        assert_eq!(filter.sanitize("<b>bold</b>", "string").unwrap(), "bold");
        assert_eq!(
            filter.sanitize("som eone@exa(mple).com", "email").unwrap(),
            "someone@example.com"
        );
    }

    #[test]
    fn absint_edge_cases() {
        let filter = Filter::new();
        assert_eq!(filter.sanitize("abc", "absint").unwrap(), "0");
        assert_eq!(filter.sanitize("007", "absint").unwrap(), "7");
        assert_eq!(filter.sanitize("+5", "absint").unwrap(), "5");
    }

    #[test]
    fn unknown_sanitizer() {
        assert_eq!(
            Filter::new().sanitize("x", "rot13"),
            Err(FilterError::UnknownSanitizer("rot13".into()))
        );
    }

    #[test]
    fn custom_sanitizer_shadows_builtin() {
        let mut filter = Filter::new();
        filter.add("trim", |v| v.replace(' ', ""));
        assert_eq!(filter.sanitize(" a b ", "trim").unwrap(), "ab");
    }

    #[test]
    fn sanitize_all_applies_in_order() {
        let filter = Filter::new();
        assert_eq!(
            filter.sanitize_all("  Hello ", &["trim", "lower"]).unwrap(),
            "hello"
        );
        assert_eq!(filter.sanitize_all("x", &[]).unwrap(), "x");
    }
}
