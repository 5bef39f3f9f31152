//! `tk admin open|close`: toggle the household editing view.

use super::Context;
use crate::output::render_success;
use clap::Subcommand;
use tickets_core::{Action, Effect};

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Open the admin view.
    Open,
    /// Close the admin view.
    Close,
}

/// Execute `tk admin open|close`.
pub fn run_admin(command: AdminCommand, ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.open();
    let (action, word) = match command {
        AdminCommand::Open => (Action::OpenAdmin, "open"),
        AdminCommand::Close => (Action::CloseAdmin, "closed"),
    };
    let message = match ctx.commit(&mut session, &action)? {
        Effect::Ignored => format!("Admin view already {word}"),
        _ => format!("Admin view {word}"),
    };
    render_success(ctx.output, &message)
}
