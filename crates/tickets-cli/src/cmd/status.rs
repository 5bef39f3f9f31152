//! `tk status`: one line per person with today's progress.

use super::Context;
use crate::output::{pretty_kv, pretty_section, render_mode};
use serde::Serialize;
use tickets_core::{Person, StateStore};

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub selected: Option<String>,
    pub admin_open: bool,
    pub people: Vec<PersonStatus>,
}

#[derive(Debug, Serialize)]
pub struct PersonStatus {
    pub name: String,
    pub assigned: usize,
    pub done_today: usize,
    pub tickets: i64,
}

impl PersonStatus {
    fn new(person: &Person, ctx: &Context) -> Self {
        Self {
            name: person.name().to_string(),
            assigned: person.assigned().count(),
            done_today: person
                .assigned()
                .filter(|id| person.completion_on(*id, &ctx.now).is_some())
                .count(),
            tickets: tickets_core::tickets_for(person, &ctx.now, ctx.rules().ticket_policy),
        }
    }
}

pub(crate) fn build_report(state: &StateStore, ctx: &Context) -> StatusReport {
    StatusReport {
        selected: state.selected_person().map(|p| p.name().to_string()),
        admin_open: state.is_admin_open(),
        people: state.people().map(|p| PersonStatus::new(p, ctx)).collect(),
    }
}

/// Execute `tk status`.
pub fn run_status(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.open();
    let report = build_report(session.state(), ctx);

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for p in &r.people {
                writeln!(w, "{}\t{}/{}\t{}", p.name, p.done_today, p.assigned, p.tickets)?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Tickets for {}", ctx.now.format("%A %Y-%m-%d")))?;
            if r.people.is_empty() {
                writeln!(w, "No people yet. Add one with `tk person add NAME`.")?;
            }
            for p in &r.people {
                let marker = if r.selected.as_deref() == Some(p.name.as_str()) {
                    "▸"
                } else {
                    " "
                };
                writeln!(
                    w,
                    "{marker} {:<12} {:>2}/{:<2} done   🎟 {}",
                    p.name, p.done_today, p.assigned, p.tickets
                )?;
            }
            writeln!(w)?;
            pretty_kv(w, "admin", if r.admin_open { "open" } else { "closed" })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputMode;
    use chrono::DateTime;
    use tickets_core::config::Config;
    use tickets_core::seed::default_state;
    use tickets_core::{Action, Rules, TaskId};

    fn ctx(now: &str) -> Context {
        Context {
            state_path: "state.json".into(),
            config: Config::default(),
            output: OutputMode::Json,
            now: DateTime::parse_from_rfc3339(now).expect("valid rfc3339"),
        }
    }

    #[test]
    fn report_counts_today_only() {
        let ctx = ctx("2024-05-02T17:00:00+02:00");
        let yesterday = DateTime::parse_from_rfc3339("2024-05-01T17:00:00+02:00").expect("valid");
        let mut state = default_state();
        for at in [yesterday, ctx.now] {
            state = state
                .apply(
                    &Action::Complete {
                        name: "Susan".into(),
                        task: TaskId::new(4),
                        at,
                    },
                    &Rules::default(),
                )
                .expect("complete")
                .state;
        }

        let report = build_report(&state, &ctx);
        let susan = report
            .people
            .iter()
            .find(|p| p.name == "Susan")
            .expect("susan");
        assert_eq!(susan.assigned, 5);
        assert_eq!(susan.done_today, 1);
        assert_eq!(susan.tickets, 1);
        assert!(report.admin_open);
        assert!(report.selected.is_none());
    }
}
