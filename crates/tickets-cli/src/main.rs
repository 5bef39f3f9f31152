#![forbid(unsafe_code)]

mod cmd;
mod output;

use chrono::{DateTime, FixedOffset, Local};
use clap::{CommandFactory, Parser, Subcommand};
use cmd::Context;
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use tickets_core::config;
use tickets_core::error::ErrorCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "tk",
    author,
    version,
    about = "tk: chores in, tickets out",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// State file to use instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Evaluate "today" as of this RFC 3339 instant instead of the clock.
    #[arg(long, global = true, value_name = "INSTANT")]
    now: Option<DateTime<FixedOffset>>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.now.unwrap_or_else(|| Local::now().fixed_offset())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Write the default household",
        long_about = "Write the default household to the state file, optionally with a config template.",
        after_help = "EXAMPLES:\n    # Start a fresh household\n    tk init\n\n    # Also write ~/.config/tickets/config.toml\n    tk init --config"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show today's progress for everyone",
        after_help = "EXAMPLES:\n    tk status\n\n    # As of a given moment\n    tk status --now 2024-06-01T19:00:00-04:00"
    )]
    Status,

    #[command(next_help_heading = "Read", about = "List people")]
    People,

    #[command(
        next_help_heading = "Read",
        about = "Show one person's tasks for today",
        after_help = "EXAMPLES:\n    tk show Billy\n\n    # The selected person\n    tk show"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show completions and redemptions, newest first",
        after_help = "EXAMPLES:\n    tk activity Susan\n\n    tk activity -n 10 --json"
    )]
    Activity(cmd::activity::ActivityArgs),

    #[command(
        next_help_heading = "Chores",
        about = "Mark a task done for today",
        after_help = "EXAMPLES:\n    tk done 3 --person Billy\n\n    # The selected person\n    tk done 3"
    )]
    Done(cmd::mark::MarkArgs),

    #[command(next_help_heading = "Chores", about = "Take back today's completion of a task")]
    Undo(cmd::mark::MarkArgs),

    #[command(next_help_heading = "Chores", about = "Flip a task between done and open for today")]
    Toggle(cmd::mark::MarkArgs),

    #[command(
        next_help_heading = "Chores",
        about = "Spend a ticket",
        long_about = "Spend one ticket. Refused when none are left unless --force is given.",
        after_help = "EXAMPLES:\n    tk redeem --person Susan\n\n    # Record it anyway\n    tk redeem --person Susan --force"
    )]
    Redeem(cmd::redeem::RedeemArgs),

    #[command(next_help_heading = "View", about = "Select the person later commands act on")]
    Select(cmd::select::SelectArgs),

    #[command(next_help_heading = "View", about = "Clear the selection")]
    Deselect,

    #[command(next_help_heading = "View", about = "Open or close the admin view")]
    Admin {
        #[command(subcommand)]
        command: cmd::admin::AdminCommand,
    },

    #[command(
        next_help_heading = "Household",
        about = "Manage tasks",
        after_help = "EXAMPLES:\n    tk task list\n    tk task add \"Feed the cat\"\n    tk task rename 6 \"Feed the cats\"\n    tk task rm 6"
    )]
    Task {
        #[command(subcommand)]
        command: cmd::task::TaskCommand,
    },

    #[command(
        next_help_heading = "Household",
        about = "Manage people",
        after_help = "EXAMPLES:\n    tk person add Caroline\n    tk person assign Caroline 1\n    tk person rename Caroline Carrie\n    tk person rm Carrie"
    )]
    Person {
        #[command(subcommand)]
        command: cmd::person::PersonCommand,
    },

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    tk completions bash > ~/.local/share/bash-completion/completions/tk"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TICKETS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "tickets=debug,tk=debug,info"
        } else {
            "tickets=info,warn"
        })
    });

    let format = env::var("TICKETS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    let config = match config::load_user_config() {
        Ok(config) => config,
        Err(err) => {
            output::render_error(
                output,
                &CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
            )?;
            return Err(err);
        }
    };

    let ctx = Context {
        state_path: config::resolve_state_path(cli.state.as_deref(), &config),
        config,
        output,
        now: cli.now(),
    };
    debug!(state = %ctx.state_path.display(), now = %ctx.now, "resolved context");

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Status => cmd::status::run_status(&ctx),
        Commands::People => cmd::people::run_people(&ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Activity(args) => cmd::activity::run_activity(args, &ctx),
        Commands::Done(args) => cmd::mark::run_done(args, &ctx),
        Commands::Undo(args) => cmd::mark::run_undo(args, &ctx),
        Commands::Toggle(args) => cmd::mark::run_toggle(args, &ctx),
        Commands::Redeem(args) => cmd::redeem::run_redeem(args, &ctx),
        Commands::Select(args) => cmd::select::run_select(args, &ctx),
        Commands::Deselect => cmd::select::run_deselect(&ctx),
        Commands::Admin { command } => cmd::admin::run_admin(*command, &ctx),
        Commands::Task { command } => cmd::task::run_task(command, &ctx),
        Commands::Person { command } => cmd::person::run_person(command, &ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
