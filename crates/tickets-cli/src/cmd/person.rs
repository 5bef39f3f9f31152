//! `tk person ...`: manage the people in the household.

use super::Context;
use crate::output::render_success;
use clap::Subcommand;
use tickets_core::{Action, TaskId};

#[derive(Subcommand, Debug)]
pub enum PersonCommand {
    /// Add a person with no tasks. Without a name they are called "new Person".
    Add {
        name: Option<String>,
    },
    /// Rename a person, keeping their tasks and history.
    Rename {
        from: String,
        to: String,
    },
    /// Remove a person and all of their history.
    Rm {
        name: String,
    },
    /// Assign a task to a person, or unassign it if already assigned.
    Assign {
        name: String,
        task: TaskId,
    },
}

/// Execute `tk person <subcommand>`.
pub fn run_person(command: &PersonCommand, ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.open();
    match command {
        PersonCommand::Add { name } => {
            let added = name
                .as_deref()
                .unwrap_or(tickets_core::model::PLACEHOLDER_PERSON_NAME)
                .to_string();
            if session.state().person(&added).is_some() && !ctx.rules().strict {
                tracing::warn!(name = %added, "replacing an existing person");
            }
            ctx.commit(&mut session, &Action::AddPerson { name: name.clone() })?;
            render_success(ctx.output, &format!("Added {added}"))
        }
        PersonCommand::Rename { from, to } => {
            ctx.person(&session, Some(from.as_str()))?;
            ctx.commit(
                &mut session,
                &Action::RenamePerson {
                    from: from.clone(),
                    to: to.clone(),
                },
            )?;
            render_success(ctx.output, &format!("Renamed {from} to {to}"))
        }
        PersonCommand::Rm { name } => {
            ctx.person(&session, Some(name.as_str()))?;
            ctx.commit(&mut session, &Action::RemovePerson { name: name.clone() })?;
            render_success(ctx.output, &format!("Removed {name}"))
        }
        PersonCommand::Assign { name, task } => {
            ctx.person(&session, Some(name.as_str()))?;
            ctx.require_task(&session, *task)?;
            ctx.commit(
                &mut session,
                &Action::ToggleAssignedTask {
                    name: name.clone(),
                    task: *task,
                },
            )?;
            let assigned = session
                .state()
                .person(name)
                .is_some_and(|p| p.is_assigned(*task));
            let message = if assigned {
                format!("Assigned task {task} to {name}")
            } else {
                format!("Unassigned task {task} from {name}")
            };
            render_success(ctx.output, &message)
        }
    }
}
