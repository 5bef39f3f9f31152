//! The single owner of the authoritative snapshot.
//!
//! A [`Session`] is what a view layer holds on to: it reads the current
//! snapshot, dispatches actions, and lets the session replace the snapshot
//! and save it. Saving is best-effort. A failed save is logged and counted,
//! and the in-memory snapshot stays authoritative.

use crate::ledger;
use crate::model::Person;
use crate::persist::{self, SnapshotStore};
use crate::store::{Action, Effect, Rules, StateStore, TransitionError};
use chrono::{DateTime, TimeDelta, TimeZone};
use tracing::warn;

#[derive(Debug)]
pub struct Session<S: SnapshotStore> {
    state: StateStore,
    rules: Rules,
    store: S,
    failed_saves: usize,
}

impl<S: SnapshotStore> Session<S> {
    /// Load from `store` (seeding when empty or unreadable) and start a session.
    pub fn open<Tz: TimeZone>(
        store: S,
        rules: Rules,
        retention: Option<TimeDelta>,
        now: &DateTime<Tz>,
    ) -> Self {
        let state = persist::load_state(&store, retention, now);
        Self::with_state(store, rules, state)
    }

    /// Start a session over an explicit snapshot.
    pub const fn with_state(store: S, rules: Rules, state: StateStore) -> Self {
        Self {
            state,
            rules,
            store,
            failed_saves: 0,
        }
    }

    /// The current snapshot.
    pub const fn state(&self) -> &StateStore {
        &self.state
    }

    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Number of saves that failed and were swallowed.
    pub const fn failed_saves(&self) -> usize {
        self.failed_saves
    }

    /// Apply `action`, replace the snapshot, and save it.
    ///
    /// # Errors
    ///
    /// Strict-mode or guard failures from [`StateStore::apply`]. On error
    /// the snapshot is unchanged and nothing is saved.
    pub fn dispatch(&mut self, action: &Action) -> Result<Effect, TransitionError> {
        let transition = self.state.apply(action, &self.rules)?;
        self.state = transition.state;
        self.persist();
        Ok(transition.effect)
    }

    /// Save the current snapshot, logging failures.
    pub fn persist(&mut self) {
        if let Err(err) = persist::save_state(&mut self.store, &self.state) {
            self.failed_saves += 1;
            warn!(code = %err.code(), %err, "failed to save state; keeping in-memory copy");
        }
    }

    /// The selected person, ignoring stale selections.
    pub fn selected_person(&self) -> Option<&Person> {
        self.state.selected_person()
    }

    /// Ticket balance of `name` under the session's policy.
    pub fn tickets_for<Tz: TimeZone>(&self, name: &str, now: &DateTime<Tz>) -> Option<i64> {
        self.state.tickets_for(name, now, self.rules.ticket_policy)
    }

    /// Whether the view should offer redemption for `person` right now.
    pub fn can_redeem<Tz: TimeZone>(&self, person: &Person, now: &DateTime<Tz>) -> bool {
        ledger::tickets_for(person, now, self.rules.ticket_policy) > 0
    }

    pub fn into_parts(self) -> (StateStore, S) {
        (self.state, self.store)
    }
}
