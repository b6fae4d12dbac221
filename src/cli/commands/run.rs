//! run command - Route the arguments and dispatch them to a task

use anyhow::{Context as _, Result};
use serde_json::{json, Value};
use tracing::debug;

use super::load_router;
use crate::cli::Context;
use crate::console::Console;
use crate::dispatch::{Dispatcher, FnTask, TaskRegistry};

/// Tasks shipped with the `phiz` binary.
pub fn builtin_tasks() -> TaskRegistry {
    let mut tasks = TaskRegistry::new();

    tasks.register("MainTask", || {
        FnTask::new().method("mainAction", |_| {
            Ok(json!("Available tasks:\n  main main\n  echo main [words...] [--case=upper|lower]\n  echo params [args...]"))
        })
    });

    tasks.register("EchoTask", || {
        FnTask::new()
            .method("mainAction", |ctx| {
                let text = ctx.params().positional().collect::<Vec<_>>().join(" ");
                let case = ctx.option("case", &["trim", "lower"], None)?;
                let text = match case.as_deref() {
                    None => text,
                    Some("upper") => text.to_uppercase(),
                    Some("lower") => text.to_lowercase(),
                    Some(other) => anyhow::bail!("unknown case '{}', expected upper or lower", other),
                };
                Ok(Value::String(text))
            })
            .method("paramsAction", |ctx| {
                Ok(json!({
                    "task": ctx.task_name(),
                    "action": ctx.action_name(),
                    "params": ctx.params(),
                    "options": ctx.options(),
                }))
            })
    });

    tasks
}

/// Route `args`, dispatch and print what the action returned.
pub fn run(ctx: &Context, args: &[String]) -> Result<()> {
    let router = load_router(ctx)?;
    let mut console = Console::new(router, Dispatcher::new(builtin_tasks()));
    console.set_argument(args, true, false);

    let returned = console.handle(None).context("Task failed")?;
    debug!(
        task = console.dispatcher().task_name(),
        action = console.dispatcher().action_name(),
        "Task finished"
    );

    match returned {
        None | Some(Value::Null) => {}
        Some(value) if ctx.json => println!("{}", serde_json::to_string_pretty(&value)?),
        Some(Value::String(text)) => crate::ui::output::print(text, ctx.verbosity()),
        Some(value) => crate::ui::output::print(serde_json::to_string_pretty(&value)?, ctx.verbosity()),
    }
    Ok(())
}
