//! `tk show`: one person's chores for today.

use super::Context;
use crate::output::{pretty_kv, pretty_section, render_mode};
use clap::Args;
use serde::Serialize;
use tickets_core::TaskId;
use tickets_core::calendar::Stamp;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Person to show. Defaults to the selected person.
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PersonView {
    pub name: String,
    pub tickets: i64,
    pub tasks: Vec<TaskLine>,
}

#[derive(Debug, Serialize)]
pub struct TaskLine {
    pub id: TaskId,
    pub title: String,
    /// When it was completed today, if it was.
    pub done_at: Option<Stamp>,
}

/// Execute `tk show [name]`.
pub fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.open();
    let person = ctx.person(&session, args.name.as_deref())?;

    let view = PersonView {
        name: person.name().to_string(),
        tickets: session.tickets_for(person.name(), &ctx.now).unwrap_or_default(),
        tasks: session
            .state()
            .assigned_tasks(person.name())
            .into_iter()
            .map(|task| TaskLine {
                id: task.id,
                title: task.title.clone(),
                done_at: person.completion_on(task.id, &ctx.now),
            })
            .collect(),
    };

    render_mode(
        ctx.output,
        &view,
        |v, w| {
            for t in &v.tasks {
                let state = if t.done_at.is_some() { "done" } else { "open" };
                writeln!(w, "{}\t{}\t{}", t.id, state, t.title)?;
            }
            Ok(())
        },
        |v, w| {
            pretty_section(w, &v.name)?;
            if v.tasks.is_empty() {
                writeln!(w, "No tasks assigned.")?;
            }
            for t in &v.tasks {
                let mark = if t.done_at.is_some() { "[x]" } else { "[ ]" };
                writeln!(w, "{mark} {:>2}  {}", t.id, t.title)?;
            }
            writeln!(w)?;
            pretty_kv(w, "tickets", v.tickets.to_string())
        },
    )
}
