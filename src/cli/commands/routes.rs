//! routes command - List the route table

use anyhow::Result;
use serde::Serialize;

use super::load_router;
use crate::cli::Context;
use crate::routing::Route;
use crate::ui::output::{self, format_route};

#[derive(Debug, Serialize)]
struct RouteEntry<'a> {
    id: usize,
    name: Option<&'a str>,
    description: Option<&'a str>,
    pattern: &'a str,
    compiled: &'a str,
    paths: Vec<(&'a str, String)>,
}

impl<'a> From<&'a Route> for RouteEntry<'a> {
    fn from(route: &'a Route) -> Self {
        Self {
            id: route.id(),
            name: route.name(),
            description: route.description(),
            pattern: route.pattern(),
            compiled: route.compiled_pattern().as_str(),
            paths: route
                .paths()
                .iter()
                .map(|(part, value)| (part, value.to_string()))
                .collect(),
        }
    }
}

/// Print every route in insertion order. Matching tries them bottom-up.
pub fn routes(ctx: &Context) -> Result<()> {
    let router = load_router(ctx)?;

    if ctx.json {
        let entries: Vec<RouteEntry<'_>> = router.routes().iter().map(RouteEntry::from).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if router.routes().is_empty() {
        output::print("No routes defined.", ctx.verbosity());
        return Ok(());
    }

    let blocks: Vec<String> = router.routes().iter().map(format_route).collect();
    output::print(blocks.join("\n"), ctx.verbosity());
    Ok(())
}
