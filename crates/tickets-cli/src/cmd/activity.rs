//! `tk activity`: a person's completions and redemptions, newest first.

use super::Context;
use crate::output::{pretty_section, render_mode};
use clap::Args;
use tickets_core::activity::{self, ActivityEntry};

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Person whose history to show. Defaults to the selected person.
    pub name: Option<String>,

    /// Show at most this many entries.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Execute `tk activity [name]`.
pub fn run_activity(args: &ActivityArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.open();
    let person = ctx.person(&session, args.name.as_deref())?;

    let mut entries = activity::activity(person, session.state().tasks());
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    let offset = *ctx.now.offset();
    render_mode(
        ctx.output,
        &entries,
        |entries, w| {
            for entry in entries {
                writeln!(
                    w,
                    "{}\t{entry}",
                    entry.when.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
                )?;
            }
            Ok(())
        },
        |entries: &Vec<ActivityEntry>, w| {
            if entries.is_empty() {
                return writeln!(w, "No activity yet.");
            }
            for (day, group) in activity::group_by_day(entries, &ctx.now) {
                pretty_section(w, &day.format("%A %Y-%m-%d").to_string())?;
                for entry in group {
                    let local = entry.when.with_timezone(&offset);
                    writeln!(w, "  {}  {entry}", local.format("%H:%M"))?;
                }
                writeln!(w)?;
            }
            Ok(())
        },
    )
}
