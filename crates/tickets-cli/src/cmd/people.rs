//! `tk people`: list everyone in the household.

use super::Context;
use crate::output::render;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PersonRow {
    pub name: String,
    pub selected: bool,
}

/// Execute `tk people`.
pub fn run_people(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.open();
    let selected = session.selected_person().map(|p| p.name().to_string());
    let rows: Vec<PersonRow> = session
        .state()
        .people()
        .map(|p| PersonRow {
            name: p.name().to_string(),
            selected: selected.as_deref() == Some(p.name()),
        })
        .collect();

    render(ctx.output, &rows, |rows, w| {
        for row in rows {
            writeln!(w, "{}", row.name)?;
        }
        Ok(())
    })
}
