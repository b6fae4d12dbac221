//! match command - Show how arguments are routed

use anyhow::Result;
use serde::Serialize;

use super::load_router;
use crate::cli::Context;
use crate::console::{arguments_from_words, parse_argv};
use crate::dispatch::Options;
use crate::routing::{Params, Router};
use crate::ui::output::{self, format_params, format_part};

/// Routing outcome, as printed by `phiz match`.
#[derive(Debug, Serialize)]
pub struct MatchReport<'a> {
    pub matched: bool,
    pub route: Option<RouteSummary<'a>>,
    pub module: &'a str,
    pub task: &'a str,
    pub action: &'a str,
    pub params: &'a Params,
    pub options: &'a Options,
    pub matches: Option<&'a [String]>,
    /// Arguments were given as parts, so no pattern was evaluated.
    #[serde(skip)]
    pub direct: bool,
}

#[derive(Debug, Serialize)]
pub struct RouteSummary<'a> {
    pub id: usize,
    pub name: Option<&'a str>,
    pub pattern: &'a str,
}

impl<'a> MatchReport<'a> {
    pub fn new(router: &'a Router, options: &'a Options) -> Self {
        Self {
            matched: router.was_matched(),
            route: router.matched_route().map(|route| RouteSummary {
                id: route.id(),
                name: route.name(),
                pattern: route.pattern(),
            }),
            module: router.module_name(),
            task: router.task_name(),
            action: router.action_name(),
            params: router.params(),
            options,
            matches: router.matches(),
            direct: false,
        }
    }

    fn render(&self) -> String {
        let matched = match &self.route {
            Some(route) => format!(
                "yes (route #{} {})",
                route.id,
                route.name.unwrap_or(route.pattern)
            ),
            None if self.direct => "n/a (parts given)".to_string(),
            None => "no (defaults applied)".to_string(),
        };

        let mut lines = vec![
            format!("matched  {}", matched),
            format!("module   {}", format_part(self.module)),
            format!("task     {}", format_part(self.task)),
            format!("action   {}", format_part(self.action)),
            format!("params   {}", format_params(self.params)),
        ];
        if !self.options.is_empty() {
            lines.push(format!("options  {}", format_params(&self.options.to_params())));
        }
        lines.join("\n")
    }
}

/// Route `args` and print the outcome.
pub fn match_args(ctx: &Context, args: &[String], parts: bool) -> Result<()> {
    let mut router = load_router(ctx)?;

    let (words, options) = parse_argv(args);
    let arguments = arguments_from_words(words, !parts, router.delimiter());
    router.handle(arguments);

    let mut report = MatchReport::new(&router, &options);
    report.direct = parts;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print(report.render(), ctx.verbosity());
    }
    Ok(())
}
