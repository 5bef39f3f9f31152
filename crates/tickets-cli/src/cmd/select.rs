//! `tk select` / `tk deselect`: choose who later commands act on.

use super::Context;
use crate::output::{CliError, render_success};
use clap::Args;
use tickets_core::Action;
use tickets_core::error::ErrorCode;

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Person to select.
    pub name: String,
}

/// Execute `tk select <name>`.
pub fn run_select(args: &SelectArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.open();
    if session.state().person(&args.name).is_none() {
        return ctx.fail(&CliError::coded(
            ErrorCode::PersonNotFound,
            format!("no person named '{}'", args.name),
        ));
    }
    ctx.commit(
        &mut session,
        &Action::SelectPerson {
            name: args.name.clone(),
        },
    )?;
    render_success(ctx.output, &format!("Selected {}", args.name))
}

/// Execute `tk deselect`.
pub fn run_deselect(ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.open();
    ctx.commit(&mut session, &Action::DeselectPerson)?;
    render_success(ctx.output, "Nobody selected")
}
