//! naming
//!
//! Name conversions between CLI words and handler names.
//!
//! # Features
//!
//! - Turn a task word into a handler class stem (`db-migrate` → `DbMigrate`)
//! - Turn a handler class name back into a task word (`DbMigrate` → `db_migrate`)

/// Convert a snake/kebab-case word to UpperCamelCase.
///
/// Segments are split on `_` and `-`; empty segments are dropped.
///
/// # Example
///
/// ```
/// use phiz_cli::naming::camelize;
///
/// assert_eq!(camelize("echo"), "Echo");
/// assert_eq!(camelize("db-migrate"), "DbMigrate");
/// assert_eq!(camelize("cache_clear_all"), "CacheClearAll");
/// ```
pub fn camelize(word: &str) -> String {
    word.split(['_', '-'])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert an UpperCamelCase name to snake_case.
///
/// # Example
///
/// ```
/// use phiz_cli::naming::uncamelize;
///
/// assert_eq!(uncamelize("Echo"), "echo");
/// assert_eq!(uncamelize("MainTask"), "main_task");
/// assert_eq!(uncamelize("already_snake"), "already_snake");
/// ```
pub fn uncamelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Check that `name` can serve as a handler name.
///
/// Handler names are non-empty and made of ASCII alphanumerics, `_` and
/// the namespace separator `\`.
pub fn is_valid_handler_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camelize_basic() {
        assert_eq!(camelize("main"), "Main");
        assert_eq!(camelize("my_task"), "MyTask");
        assert_eq!(camelize("my--task"), "MyTask");
    }

    #[test]
    fn camelize_handles_empty() {
        assert_eq!(camelize(""), "");
    }

    #[test]
    fn uncamelize_basic() {
        assert_eq!(uncamelize("Posts"), "posts");
        assert_eq!(uncamelize("CacheClearAll"), "cache_clear_all");
    }

    #[test]
    fn camelize_round_trips_snake_case() {
        assert_eq!(uncamelize(&camelize("cache_clear")), "cache_clear");
    }

    #[test]
    fn handler_names() {
        assert!(is_valid_handler_name("EchoTask"));
        assert!(is_valid_handler_name(r"App\Tasks\EchoTask"));
        assert!(!is_valid_handler_name(""));
        assert!(!is_valid_handler_name("Echo Task"));
        assert!(!is_valid_handler_name("../etc"));
    }
}
