//! routing::pattern
//!
//! Route pattern compilation.
//!
//! # Pattern Language
//!
//! - Literal text, compared for exact equality when nothing regex-like remains
//! - `:delimiter` - replaced by the active delimiter
//! - `:module`, `:task`, `:action` - `DELIM([a-zA-Z0-9_-]+)` when preceded by the delimiter
//! - `:params` - `(DELIM.*)*` when preceded by the delimiter
//! - `:int` - `DELIM([0-9]+)` when preceded by the delimiter
//! - `{name}` - `([^DELIM]+)`, position recorded under `name`
//! - `{name:fragment}` - `(fragment)`, or the fragment as-is when it already
//!   contains a capture group
//! - Inline groups `(...)` and classes `[...]`
//! - A pattern starting with `#` is a complete `#regex#flags` and only has
//!   `:delimiter` substituted
//!
//! A translated pattern containing `(` or `[` is anchored and compiled as a
//! regex; anything else stays a literal.
//!
//! # Context
//!
//! [`RouteCompiler`] carries the delimiter and the route id counter. Clones
//! share the id counter, so routers built from clones of one compiler hand
//! out globally unique ids while keeping their own delimiter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use regex::Regex;

use super::route::RouteError;

/// Delimiter used for CLI argument strings.
pub const DEFAULT_DELIMITER: char = ' ';

const ID_PATTERN: &str = "([a-zA-Z0-9_-]+)";

/// Compilation context shared by the routes of a router.
#[derive(Debug, Clone)]
pub struct RouteCompiler {
    delimiter: char,
    ids: Arc<AtomicUsize>,
}

impl Default for RouteCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteCompiler {
    /// Create a compiler with a fresh id counter and the default delimiter.
    pub fn new() -> Self {
        Self::with_delimiter(DEFAULT_DELIMITER)
    }

    /// Create a compiler with a fresh id counter and a custom delimiter.
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            ids: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The active delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Change the delimiter. Only routes compiled afterwards are affected.
    pub fn set_delimiter(&mut self, delimiter: char) {
        self.delimiter = delimiter;
    }

    /// Restore the default delimiter and restart ids at zero.
    ///
    /// The counter is shared with clones of this compiler.
    pub fn reset(&mut self) {
        self.delimiter = DEFAULT_DELIMITER;
        self.ids.store(0, Ordering::Relaxed);
    }

    pub(crate) fn next_id(&self) -> usize {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }

    /// Compile a raw pattern.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::InvalidPattern` for unclosed named parameters and
    /// for patterns the regex engine rejects.
    ///
    /// # Example
    ///
    /// ```
    /// use phiz_cli::routing::RouteCompiler;
    ///
    /// let compiler = RouteCompiler::new();
    /// let compiled = compiler.compile("show {id:[0-9]+}").unwrap();
    /// assert_eq!(compiled.pattern.as_str(), "#^show ([0-9]+)$#");
    /// assert_eq!(compiled.positions, vec![("id".to_string(), 1)]);
    /// ```
    pub fn compile(&self, pattern: &str) -> Result<Compiled, RouteError> {
        if pattern.starts_with('#') {
            let escaped = regex::escape(&self.delimiter.to_string());
            let source = pattern.replace(":delimiter", &escaped);
            let regex = build_delimited(&source, pattern)?;
            return Ok(Compiled {
                pattern: CompiledPattern::Regex { source, regex },
                positions: Vec::new(),
                placeholders: Vec::new(),
            });
        }

        let raw = self.delimiter.to_string();
        let mut translated =
            Translator::new(self.delimiter).run(&pattern.replace(":delimiter", &raw), pattern)?;
        let is_regex = translated.output.contains('(') || translated.output.contains('[');

        // A regex needs the delimiter escaped; a literal keeps it as typed.
        let escaped = regex::escape(&raw);
        if is_regex && escaped != raw {
            translated = Translator::new(self.delimiter)
                .run(&pattern.replace(":delimiter", &escaped), pattern)?;
        }

        let compiled = if is_regex {
            let regex = Regex::new(&format!("^{}$", translated.output)).map_err(|e| {
                RouteError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                }
            })?;
            CompiledPattern::Regex {
                source: format!("#^{}$#", translated.output),
                regex,
            }
        } else {
            CompiledPattern::Literal(translated.output)
        };

        Ok(Compiled {
            pattern: compiled,
            positions: translated.positions,
            placeholders: translated.placeholders,
        })
    }
}

/// Output of [`RouteCompiler::compile`].
#[derive(Debug, Clone)]
pub struct Compiled {
    pub pattern: CompiledPattern,
    /// Positions of `{name}` tokens, in pattern order.
    pub positions: Vec<(String, usize)>,
    /// Positions of `:module`/`:task`/`:action`/`:params` placeholders.
    pub placeholders: Vec<(String, usize)>,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    /// Matched by exact string equality.
    Literal(String),
    /// Matched by an anchored regex. `source` is the `#...#` form.
    Regex { source: String, regex: Regex },
}

impl CompiledPattern {
    /// The compiled pattern as text.
    pub fn as_str(&self) -> &str {
        match self {
            CompiledPattern::Literal(s) => s,
            CompiledPattern::Regex { source, .. } => source,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, CompiledPattern::Regex { .. })
    }

    /// Match `input`, returning the captured groups on success.
    ///
    /// Index 0 is the whole match. Groups that did not participate but
    /// precede a participating group come back as empty strings; trailing
    /// non-participating groups are dropped. A literal match captures
    /// nothing.
    pub fn captures(&self, input: &str) -> Option<Captured> {
        match self {
            CompiledPattern::Literal(s) => (s == input).then_some(Captured::Literal),
            CompiledPattern::Regex { regex, .. } => {
                let caps = regex.captures(input)?;
                let last = (0..caps.len())
                    .rev()
                    .find(|&i| caps.get(i).is_some())
                    .unwrap_or(0);
                let groups = (0..=last)
                    .map(|i| {
                        caps.get(i)
                            .map(|m| m.as_str().to_string())
                            .unwrap_or_default()
                    })
                    .collect();
                Some(Captured::Groups(groups))
            }
        }
    }
}

impl std::fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful pattern match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Literal,
    Groups(Vec<String>),
}

impl Captured {
    /// Group at `position`, if it exists.
    pub fn group(&self, position: usize) -> Option<&str> {
        match self {
            Captured::Literal => None,
            Captured::Groups(groups) => groups.get(position).map(String::as_str),
        }
    }

    /// All groups, or `None` for a literal match.
    pub fn into_groups(self) -> Option<Vec<String>> {
        match self {
            Captured::Literal => None,
            Captured::Groups(groups) => Some(groups),
        }
    }
}

/// Build a regex from a `#body#flags` source.
fn build_delimited(source: &str, original: &str) -> Result<Regex, RouteError> {
    let invalid = |message: String| RouteError::InvalidPattern {
        pattern: original.to_string(),
        message,
    };

    let inner = &source[1..];
    let end = inner
        .rfind('#')
        .ok_or_else(|| invalid("missing closing '#'".to_string()))?;
    let (body, flags) = (&inner[..end], &inner[end + 1..]);

    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' => inline.push(flag),
            'u' => {}
            other => return Err(invalid(format!("unsupported flag '{}'", other))),
        }
    }

    let full = if inline.is_empty() {
        body.to_string()
    } else {
        format!("(?{}){}", inline, body)
    };
    Regex::new(&full).map_err(|e| invalid(e.to_string()))
}

struct Translation {
    output: String,
    positions: Vec<(String, usize)>,
    placeholders: Vec<(String, usize)>,
}

/// Single left-to-right pass that rewrites tokens and numbers groups.
struct Translator {
    delimiter: char,
    escaped: String,
    output: String,
    groups: usize,
    positions: Vec<(String, usize)>,
    placeholders: Vec<(String, usize)>,
}

impl Translator {
    fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            escaped: regex::escape(&delimiter.to_string()),
            output: String::new(),
            groups: 0,
            positions: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    fn run(mut self, pattern: &str, original: &str) -> Result<Translation, RouteError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\\' && self.escaped.len() > 1 && starts_with(&chars[i..], &self.escaped) {
                let width = self.escaped.chars().count();
                if let Some(consumed) = self.placeholder(&chars[i + width..]) {
                    i += width + consumed;
                    continue;
                }
            }

            if c == '\\' || c == '[' || c == '(' {
                let consumed = copy_regex_unit(&chars[i..], &mut self.output, &mut self.groups);
                i += consumed;
                continue;
            }

            if c == self.delimiter {
                if let Some(consumed) = self.placeholder(&chars[i + 1..]) {
                    i += 1 + consumed;
                    continue;
                }
            }

            if c == '{' {
                if let Some(consumed) = self.named(&chars[i..], original)? {
                    i += consumed;
                    continue;
                }
            }

            self.output.push(c);
            i += 1;
        }

        Ok(Translation {
            output: self.output,
            positions: self.positions,
            placeholders: self.placeholders,
        })
    }

    /// Rewrite a legacy placeholder following the delimiter.
    fn placeholder(&mut self, rest: &[char]) -> Option<usize> {
        const TOKENS: [&str; 5] = [":module", ":task", ":action", ":params", ":int"];

        let token = TOKENS.iter().find(|t| starts_with(rest, t))?;
        let delimiter = &self.escaped;
        let fragment = match *token {
            ":params" => format!("({}.*)*", delimiter),
            ":int" => format!("{}([0-9]+)", delimiter),
            _ => format!("{}{}", delimiter, ID_PATTERN),
        };
        self.output.push_str(&fragment);
        self.groups += 1;
        if *token != ":int" {
            self.placeholders
                .push((token[1..].to_string(), self.groups));
        }
        Some(token.len())
    }

    /// Rewrite a `{name}` or `{name:fragment}` token.
    ///
    /// Returns `None` when the brace does not open a named token (e.g. a
    /// quantifier), leaving it to be copied verbatim.
    fn named(&mut self, chars: &[char], original: &str) -> Result<Option<usize>, RouteError> {
        let mut i = 1;
        match chars.get(i) {
            Some(c) if c.is_ascii_alphabetic() || *c == '_' => {}
            _ => return Ok(None),
        }
        while chars
            .get(i)
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        {
            i += 1;
        }
        let name: String = chars[1..i].iter().collect();

        let fragment = match chars.get(i) {
            Some('}') => {
                i += 1;
                None
            }
            Some(':') => {
                let start = i + 1;
                let end = closing_brace(chars, start).ok_or_else(|| {
                    RouteError::InvalidPattern {
                        pattern: original.to_string(),
                        message: format!("unclosed named parameter '{}'", name),
                    }
                })?;
                i = end + 1;
                let fragment: String = chars[start..end].iter().collect();
                (!fragment.is_empty()).then_some(fragment)
            }
            _ => return Ok(None),
        };

        let position = self.groups + 1;
        match fragment {
            None => {
                self.output
                    .push_str(&format!("([^{}]+)", self.escaped));
                self.groups += 1;
            }
            Some(fragment) => {
                let mut inner = String::new();
                let mut inner_groups = 0;
                let fragment_chars: Vec<char> = fragment.chars().collect();
                let mut j = 0;
                while j < fragment_chars.len() {
                    j += copy_regex_unit(&fragment_chars[j..], &mut inner, &mut inner_groups);
                }
                if inner_groups > 0 {
                    self.output.push_str(&inner);
                    self.groups += inner_groups;
                } else {
                    self.output.push('(');
                    self.output.push_str(&inner);
                    self.output.push(')');
                    self.groups += 1;
                }
            }
        }

        self.positions.retain(|(n, _)| *n != name);
        self.positions.push((name, position));
        Ok(Some(i))
    }
}

/// Copy one regex unit starting at `chars[0]` into `out`.
///
/// A unit is an escape sequence, a whole character class, an opening
/// parenthesis (counted when it opens a capture group) or a single char.
/// Returns the number of chars consumed.
fn copy_regex_unit(chars: &[char], out: &mut String, groups: &mut usize) -> usize {
    match chars[0] {
        '\\' => {
            out.push('\\');
            match chars.get(1) {
                Some(next) => {
                    out.push(*next);
                    2
                }
                None => 1,
            }
        }
        '[' => {
            let mut i = 1;
            if chars.get(i) == Some(&'^') {
                i += 1;
            }
            if chars.get(i) == Some(&']') {
                i += 1;
            }
            while i < chars.len() && chars[i] != ']' {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            let end = (i + 1).min(chars.len());
            out.extend(&chars[..end]);
            end
        }
        '(' => {
            if opens_capture(&chars[1..]) {
                *groups += 1;
            }
            out.push('(');
            1
        }
        c => {
            out.push(c);
            1
        }
    }
}

/// Whether the text after `(` opens a capturing group.
fn opens_capture(rest: &[char]) -> bool {
    match rest.first() {
        Some('?') => {
            starts_with(rest, "?P<")
                || (starts_with(rest, "?<") && !starts_with(rest, "?<=") && !starts_with(rest, "?<!"))
        }
        _ => true,
    }
}

/// Index of the `}` closing a named token whose body starts at `start`.
fn closing_brace(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 1;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn starts_with(chars: &[char], prefix: &str) -> bool {
    let mut iter = chars.iter();
    prefix.chars().all(|p| iter.next() == Some(&p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> Compiled {
        RouteCompiler::new().compile(pattern).unwrap()
    }

    #[test]
    fn plain_text_stays_literal() {
        let compiled = compile("very static route");
        assert!(!compiled.pattern.is_regex());
        assert_eq!(compiled.pattern.as_str(), "very static route");
    }

    #[test]
    fn literal_matches_exactly() {
        let compiled = compile("very static route");
        assert!(compiled.pattern.captures("very static route").is_some());
        assert!(compiled.pattern.captures("very static routes").is_none());
    }

    #[test]
    fn delimiter_placeholder_substituted() {
        let compiler = RouteCompiler::with_delimiter('/');
        let compiled = compiler.compile("a:delimiterb").unwrap();
        assert_eq!(compiled.pattern.as_str(), "a/b");
    }

    #[test]
    fn delimiter_placeholder_escaped_in_regex() {
        let compiler = RouteCompiler::with_delimiter('.');
        let compiled = compiler.compile("go:delimiter(x)").unwrap();
        assert_eq!(compiled.pattern.as_str(), r"#^go\.(x)$#");
        assert!(compiled.pattern.captures("goZx").is_none());
        assert!(compiled.pattern.captures("go.x").is_some());

        let literal = compiler.compile("a:delimiterb").unwrap();
        assert!(!literal.pattern.is_regex());
        assert_eq!(literal.pattern.as_str(), "a.b");
    }

    #[test]
    fn escaped_delimiter_still_opens_placeholders() {
        let compiler = RouteCompiler::with_delimiter('.');
        let compiled = compiler.compile("run:delimiter:task:delimiter(x)").unwrap();
        assert_eq!(
            compiled.pattern.as_str(),
            r"#^run\.([a-zA-Z0-9_-]+)\.(x)$#"
        );
        assert_eq!(compiled.placeholders, vec![("task".to_string(), 1)]);
        assert!(compiled.pattern.captures("run.deploy.x").is_some());
        assert!(compiled.pattern.captures("runXdeployYx").is_none());
    }

    #[test]
    fn legacy_tokens_expand() {
        let compiled = compile("admin :task :action :params");
        assert_eq!(
            compiled.pattern.as_str(),
            "#^admin ([a-zA-Z0-9_-]+) ([a-zA-Z0-9_-]+)( .*)*$#"
        );
        assert_eq!(
            compiled.placeholders,
            vec![
                ("task".to_string(), 1),
                ("action".to_string(), 2),
                ("params".to_string(), 3)
            ]
        );
    }

    #[test]
    fn int_token_is_not_recorded() {
        let compiled = compile("show :int");
        assert_eq!(compiled.pattern.as_str(), "#^show ([0-9]+)$#");
        assert!(compiled.placeholders.is_empty());
    }

    #[test]
    fn named_token_default_fragment() {
        let compiled = compile("edit {id}");
        assert_eq!(compiled.pattern.as_str(), "#^edit ([^ ]+)$#");
        assert_eq!(compiled.positions, vec![("id".to_string(), 1)]);
    }

    #[test]
    fn named_token_with_group_kept_as_is() {
        let compiled = compile(r"named-manual {language:([a-z]{2})} {file:[a-z\.]+}\.txt");
        assert_eq!(
            compiled.pattern.as_str(),
            r"#^named-manual ([a-z]{2}) ([a-z\.]+)\.txt$#"
        );
        assert_eq!(
            compiled.positions,
            vec![("language".to_string(), 1), ("file".to_string(), 2)]
        );
    }

    #[test]
    fn named_positions_follow_inline_groups() {
        let compiled = compile("(foo|bar) {id:[0-9]+}");
        assert_eq!(compiled.positions, vec![("id".to_string(), 2)]);
    }

    #[test]
    fn non_capturing_groups_not_counted() {
        let compiled = compile("(?:foo|bar) {id:[0-9]+}");
        assert_eq!(compiled.positions, vec![("id".to_string(), 1)]);
    }

    #[test]
    fn quantifier_braces_untouched() {
        let compiled = compile("([0-9]{4})");
        assert_eq!(compiled.pattern.as_str(), "#^([0-9]{4})$#");
        assert!(compiled.positions.is_empty());
    }

    #[test]
    fn unclosed_named_token_rejected() {
        let result = RouteCompiler::new().compile("x {id:[0-9]+");
        assert!(matches!(result, Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    fn invalid_regex_rejected() {
        let result = RouteCompiler::new().compile("x (unclosed");
        assert!(matches!(result, Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    fn raw_regex_pattern() {
        let compiled = compile("#^(?::delimiter)?([a-z]+)$#");
        assert_eq!(compiled.pattern.as_str(), "#^(?: )?([a-z]+)$#");
        assert!(compiled.pattern.captures(" echo").is_some());
    }

    #[test]
    fn raw_regex_flags() {
        let compiled = compile("#^echo$#i");
        assert!(compiled.pattern.captures("ECHO").is_some());
    }

    #[test]
    fn captures_fill_inner_gaps_and_drop_trailing() {
        let compiled = compile("#^(a)?(b)?(c)?$#");
        let captured = compiled.pattern.captures("b").unwrap();
        assert_eq!(
            captured,
            Captured::Groups(vec!["b".into(), "".into(), "b".into()])
        );
    }

    #[test]
    fn ids_shared_between_clones() {
        let compiler = RouteCompiler::new();
        let other = compiler.clone();
        assert_eq!(compiler.next_id(), 0);
        assert_eq!(other.next_id(), 1);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut compiler = RouteCompiler::with_delimiter('/');
        compiler.next_id();
        compiler.reset();
        assert_eq!(compiler.delimiter(), ' ');
        assert_eq!(compiler.next_id(), 0);
    }
}
