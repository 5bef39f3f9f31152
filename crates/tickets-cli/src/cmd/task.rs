//! `tk task ...`: manage the task registry.

use super::Context;
use crate::output::{CliError, render, render_success};
use clap::Subcommand;
use serde::Serialize;
use tickets_core::error::ErrorCode;
use tickets_core::{Action, Effect, TaskId};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List every task with its id.
    List,
    /// Create a task. Without a title it is called "new Task".
    Add {
        /// Title of the new task.
        title: Option<String>,
    },
    /// Change a task's title.
    Rename {
        id: TaskId,
        title: String,
    },
    /// Delete a task and unassign it from everyone.
    Rm {
        id: TaskId,
    },
}

#[derive(Debug, Serialize)]
struct TaskRow<'a> {
    id: TaskId,
    title: &'a str,
    assigned_to: Vec<&'a str>,
}

/// Execute `tk task <subcommand>`.
pub fn run_task(command: &TaskCommand, ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.open();
    match command {
        TaskCommand::List => {
            let state = session.state();
            let rows: Vec<TaskRow<'_>> = state
                .tasks()
                .iter()
                .map(|task| TaskRow {
                    id: task.id,
                    title: &task.title,
                    assigned_to: state
                        .people()
                        .filter(|p| p.is_assigned(task.id))
                        .map(tickets_core::Person::name)
                        .collect(),
                })
                .collect();
            render(ctx.output, &rows, |rows, w| {
                for row in rows {
                    writeln!(w, "{}\t{}\t{}", row.id, row.title, row.assigned_to.join(","))?;
                }
                Ok(())
            })
        }
        TaskCommand::Add { title } => {
            let effect = ctx.commit(
                &mut session,
                &Action::AddTask {
                    title: title.clone(),
                },
            )?;
            let Effect::TaskCreated(id) = effect else {
                return ctx.fail(&CliError::coded(
                    ErrorCode::InternalUnexpected,
                    "task was not created",
                ));
            };
            let title = session.state().tasks().title(id).unwrap_or_default();
            render_success(ctx.output, &format!("Added task {id}: {title}"))
        }
        TaskCommand::Rename { id, title } => {
            ctx.require_task(&session, *id)?;
            ctx.commit(
                &mut session,
                &Action::RenameTask {
                    id: *id,
                    title: title.clone(),
                },
            )?;
            render_success(ctx.output, &format!("Renamed task {id} to {title}"))
        }
        TaskCommand::Rm { id } => {
            ctx.require_task(&session, *id)?;
            ctx.commit(&mut session, &Action::RemoveTask { id: *id })?;
            render_success(ctx.output, &format!("Removed task {id}"))
        }
    }
}
