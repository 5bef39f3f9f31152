//! `tk init`: write the default household (and optionally a config file).

use super::Context;
use crate::output::{CliError, pretty_kv, render_mode};
use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tickets_core::config;
use tickets_core::persist;
use tickets_core::seed;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,

    /// Also write a config template to the config location.
    #[arg(long)]
    pub config: bool,
}

#[derive(Debug, Serialize)]
pub struct InitReport {
    pub state_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    pub people: usize,
    pub tasks: usize,
}

/// Execute `tk init`.
///
/// # Errors
///
/// Fails when the state file (or config file with `--config`) already
/// exists and `--force` is not set, or when writing fails.
pub fn run_init(args: &InitArgs, ctx: &Context) -> anyhow::Result<()> {
    if ctx.state_path.exists() && !args.force {
        return ctx.fail(&CliError {
            message: format!("{} already exists", ctx.state_path.display()),
            suggestion: Some("Use `tk init --force` to start over.".to_string()),
            error_code: None,
        });
    }

    let config_path = if args.config {
        let Some(path) = config::default_config_path() else {
            return ctx.fail(&CliError::new("no config directory on this system"));
        };
        if path.exists() && !args.force {
            return ctx.fail(&CliError {
                message: format!("{} already exists", path.display()),
                suggestion: Some("Use `tk init --config --force` to overwrite.".to_string()),
                error_code: None,
            });
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, config::config_template())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    let state = seed::default_state();
    let mut store = ctx.store();
    if let Err(err) = persist::save_state(&mut store, &state) {
        return ctx.fail(&CliError::coded(err.code(), err.to_string()));
    }
    tracing::info!(path = %ctx.state_path.display(), "initialized state");

    let report = InitReport {
        state_path: ctx.state_path.clone(),
        config_path,
        people: state.person_count(),
        tasks: state.tasks().len(),
    };
    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "{}", r.state_path.display()),
        |r, w| {
            writeln!(w, "✓ Household ready")?;
            pretty_kv(w, "state", r.state_path.display().to_string())?;
            if let Some(path) = &r.config_path {
                pretty_kv(w, "config", path.display().to_string())?;
            }
            pretty_kv(w, "people", r.people.to_string())?;
            pretty_kv(w, "tasks", r.tasks.to_string())
        },
    )
}
