//! `tk redeem`: spend one ticket.

use super::Context;
use crate::output::{CliError, render_mode};
use clap::Args;
use serde::Serialize;
use tickets_core::Action;
use tickets_core::error::ErrorCode;

#[derive(Args, Debug)]
pub struct RedeemArgs {
    /// Person spending the ticket. Defaults to the selected person.
    #[arg(short, long)]
    pub person: Option<String>,

    /// Record the redemption even when no tickets are left.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct RedeemOutcome {
    pub person: String,
    pub tickets: i64,
    pub redeemed_today: usize,
}

/// Execute `tk redeem`.
///
/// Refuses when the balance is not positive unless `--force` is given.
pub fn run_redeem(args: &RedeemArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.open();
    let person = ctx.person(&session, args.person.as_deref())?;
    let name = person.name().to_string();

    if !args.force && !session.can_redeem(person, &ctx.now) {
        let tickets = session.tickets_for(&name, &ctx.now).unwrap_or_default();
        return ctx.fail(&CliError::coded(
            ErrorCode::NoTickets,
            format!("{name} has {tickets} ticket(s) to spend"),
        ));
    }

    ctx.commit(
        &mut session,
        &Action::Redeem {
            name: name.clone(),
            at: ctx.now,
        },
    )?;

    let redeemed_today = session.state().person(&name).map_or(0, |p| {
        p.redemptions()
            .iter()
            .filter(|when| tickets_core::calendar::same_day(when, &ctx.now))
            .count()
    });
    let outcome = RedeemOutcome {
        tickets: session.tickets_for(&name, &ctx.now).unwrap_or_default(),
        person: name,
        redeemed_today,
    };

    render_mode(
        ctx.output,
        &outcome,
        |o, w| writeln!(w, "{}\t{}", o.person, o.tickets),
        |o, w| {
            writeln!(w, "🎟 {} redeemed a ticket", o.person)?;
            writeln!(w, "  tickets left{}: {}", ctx.balance_period(), o.tickets)
        },
    )
}
