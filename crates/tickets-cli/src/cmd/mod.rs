//! Command handlers and the context they share.

pub mod activity;
pub mod admin;
pub mod completions;
pub mod init;
pub mod mark;
pub mod people;
pub mod person;
pub mod redeem;
pub mod select;
pub mod show;
pub mod status;
pub mod task;

use crate::output::{CliError, OutputMode, render_error};
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use tickets_core::config::Config;
use tickets_core::error::ErrorCode;
use tickets_core::persist::FileStore;
use tickets_core::ledger::TicketPolicy;
use tickets_core::{Action, Effect, Person, Rules, Session, TaskId};

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    pub state_path: PathBuf,
    pub config: Config,
    pub output: OutputMode,
    /// The instant the command runs at. Its offset decides "today".
    pub now: DateTime<FixedOffset>,
}

impl Context {
    pub const fn rules(&self) -> Rules {
        self.config.rules
    }

    /// The period a ticket balance covers, for labels: `" today"` under the
    /// daily policy, empty when tickets accumulate.
    pub const fn balance_period(&self) -> &'static str {
        match self.config.rules.ticket_policy {
            TicketPolicy::Daily => " today",
            TicketPolicy::Cumulative => "",
        }
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.state_path).with_lock_timeout(self.config.store.lock_timeout())
    }

    /// Load the snapshot (seeding if needed) and start a session over it.
    pub fn open(&self) -> Session<FileStore> {
        Session::open(
            self.store(),
            self.rules(),
            self.config.store.retention(),
            &self.now,
        )
    }

    /// Render `error` and turn it into the command's failure.
    pub fn fail<T>(&self, error: &CliError) -> anyhow::Result<T> {
        render_error(self.output, error)?;
        anyhow::bail!("{}", error.message)
    }

    /// Dispatch `action`, failing the command on transition errors. A save
    /// failure is only logged; the command still reports the new state.
    pub fn commit(&self, session: &mut Session<FileStore>, action: &Action) -> anyhow::Result<Effect> {
        match session.dispatch(action) {
            Ok(effect) => Ok(effect),
            Err(err) => self.fail(&CliError::from(&err)),
        }
    }

    /// The person a command acts on: `explicit` when given, else the
    /// selected person.
    pub fn person<'s>(
        &self,
        session: &'s Session<FileStore>,
        explicit: Option<&str>,
    ) -> anyhow::Result<&'s Person> {
        match explicit {
            Some(name) => match session.state().person(name) {
                Some(person) => Ok(person),
                None => self.fail(&CliError::coded(
                    ErrorCode::PersonNotFound,
                    format!("no person named '{name}'"),
                )),
            },
            None => match session.selected_person() {
                Some(person) => Ok(person),
                None => self.fail(&CliError {
                    message: "no person selected".to_string(),
                    suggestion: Some("Pass --person NAME or run `tk select NAME`.".to_string()),
                    error_code: Some(ErrorCode::PersonNotFound.code().to_string()),
                }),
            },
        }
    }

    /// Fail unless `task` exists in the registry.
    pub fn require_task(&self, session: &Session<FileStore>, task: TaskId) -> anyhow::Result<()> {
        if session.state().tasks().contains(task) {
            Ok(())
        } else {
            self.fail(&CliError::coded(
                ErrorCode::TaskNotFound,
                format!("no task with id {task}"),
            ))
        }
    }
}
