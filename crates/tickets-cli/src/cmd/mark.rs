//! `tk done`, `tk undo`, `tk toggle`: record or retract today's completion.

use super::Context;
use crate::output::render_mode;
use clap::Args;
use serde::Serialize;
use tickets_core::{Action, Effect, TaskId};

#[derive(Args, Debug)]
pub struct MarkArgs {
    /// Task id (see `tk show`).
    pub task: TaskId,

    /// Person to act on. Defaults to the selected person.
    #[arg(short, long)]
    pub person: Option<String>,
}

/// How a mark command left the task.
#[derive(Debug, Serialize)]
pub struct MarkOutcome {
    pub person: String,
    pub task: TaskId,
    pub title: Option<String>,
    pub done_today: bool,
    /// `false` when the task was already in the requested state.
    pub changed: bool,
    pub tickets: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Done,
    Undo,
    Toggle,
}

/// Execute `tk done <task>`. Completing twice on one day is a no-op.
pub fn run_done(args: &MarkArgs, ctx: &Context) -> anyhow::Result<()> {
    run_mark(args, ctx, Mark::Done)
}

/// Execute `tk undo <task>`.
pub fn run_undo(args: &MarkArgs, ctx: &Context) -> anyhow::Result<()> {
    run_mark(args, ctx, Mark::Undo)
}

/// Execute `tk toggle <task>`.
pub fn run_toggle(args: &MarkArgs, ctx: &Context) -> anyhow::Result<()> {
    run_mark(args, ctx, Mark::Toggle)
}

fn run_mark(args: &MarkArgs, ctx: &Context, mark: Mark) -> anyhow::Result<()> {
    let mut session = ctx.open();
    let person = ctx.person(&session, args.person.as_deref())?;
    let name = person.name().to_string();
    let already_done = person.completion_on(args.task, &ctx.now).is_some();

    // Undo works on tasks that were removed since; the others need a live task.
    if mark != Mark::Undo {
        ctx.require_task(&session, args.task)?;
    }

    let action = match mark {
        Mark::Done if already_done => None,
        Mark::Done => Some(Action::Complete {
            name: name.clone(),
            task: args.task,
            at: ctx.now,
        }),
        Mark::Undo => Some(Action::Uncomplete {
            name: name.clone(),
            task: args.task,
            at: ctx.now,
        }),
        Mark::Toggle => Some(Action::ToggleCompletion {
            name: name.clone(),
            task: args.task,
            at: ctx.now,
        }),
    };
    let changed = match action {
        Some(action) => ctx.commit(&mut session, &action)? != Effect::Ignored,
        None => false,
    };

    let outcome = MarkOutcome {
        title: session.state().tasks().title(args.task).map(str::to_string),
        done_today: session
            .state()
            .person(&name)
            .and_then(|p| p.completion_on(args.task, &ctx.now))
            .is_some(),
        tickets: session.tickets_for(&name, &ctx.now).unwrap_or_default(),
        person: name,
        task: args.task,
        changed,
    };

    render_mode(
        ctx.output,
        &outcome,
        |o, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                o.person,
                o.task,
                if o.done_today { "done" } else { "open" },
                o.tickets
            )
        },
        |o, w| {
            let title = o.title.as_deref().unwrap_or(tickets_core::activity::REMOVED_TASK_LABEL);
            match (o.changed, o.done_today) {
                (true, true) => writeln!(w, "✓ {}: {title}", o.person)?,
                (true, false) => writeln!(w, "↺ {}: {title} reopened", o.person)?,
                (false, true) => writeln!(w, "= {}: {title} already done today", o.person)?,
                (false, false) => writeln!(w, "= {}: {title} not done today", o.person)?,
            }
            writeln!(w, "  tickets{}: {}", ctx.balance_period(), o.tickets)
        },
    )
}
