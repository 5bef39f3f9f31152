//! The state store and its reducer.
//!
//! A [`StateStore`] is one immutable snapshot of everything the household
//! tracker knows: the task registry, the people, and the two bits of view
//! state (focused person, admin view open). Every change goes through
//! [`StateStore::apply`], which returns a fresh snapshot and leaves the
//! original untouched.
//!
//! # Missing references
//!
//! Transitions that name an unknown person or task are silent no-ops by
//! default ([`Effect::Ignored`]). With [`Rules::strict`] they fail with
//! [`TransitionError`] instead. Duplicate names on add/rename overwrite the
//! existing person unless strict mode is on.

use crate::error::ErrorCode;
use crate::ledger::{self, TicketPolicy};
use crate::model::{PLACEHOLDER_PERSON_NAME, PLACEHOLDER_TASK_TITLE, Person, Task, TaskId, TaskRegistry};
use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Policy knobs consulted by the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// How the ticket balance is computed.
    pub ticket_policy: TicketPolicy,
    /// Report unknown names/ids and name collisions instead of ignoring them.
    pub strict: bool,
    /// Refuse `Redeem` when the balance is not positive.
    pub guard_redemptions: bool,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A requested state change. Time-dependent actions carry the instant they
/// happened at; its offset decides which calendar day it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a task. `None` uses the placeholder title.
    AddTask { title: Option<String> },
    RenameTask { id: TaskId, title: String },
    /// Delete a task and unassign it from everyone. Completion logs keep it.
    RemoveTask { id: TaskId },
    /// Create an empty person. `None` uses the placeholder name.
    AddPerson { name: Option<String> },
    RenamePerson { from: String, to: String },
    RemovePerson { name: String },
    ToggleAssignedTask { name: String, task: TaskId },
    /// Append a completion. Append-only; see [`Action::ToggleCompletion`]
    /// for the one-per-day variant.
    Complete {
        name: String,
        task: TaskId,
        at: DateTime<FixedOffset>,
    },
    /// Remove one completion from `at`'s calendar day, if there is one.
    Uncomplete {
        name: String,
        task: TaskId,
        at: DateTime<FixedOffset>,
    },
    /// Uncomplete when completed on `at`'s day, complete otherwise.
    ToggleCompletion {
        name: String,
        task: TaskId,
        at: DateTime<FixedOffset>,
    },
    Redeem {
        name: String,
        at: DateTime<FixedOffset>,
    },
    SelectPerson { name: String },
    DeselectPerson,
    OpenAdmin,
    CloseAdmin,
}

impl Action {
    /// Stable short name, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddTask { .. } => "task.add",
            Self::RenameTask { .. } => "task.rename",
            Self::RemoveTask { .. } => "task.remove",
            Self::AddPerson { .. } => "person.add",
            Self::RenamePerson { .. } => "person.rename",
            Self::RemovePerson { .. } => "person.remove",
            Self::ToggleAssignedTask { .. } => "person.assign",
            Self::Complete { .. } => "completion.add",
            Self::Uncomplete { .. } => "completion.remove",
            Self::ToggleCompletion { .. } => "completion.toggle",
            Self::Redeem { .. } => "redemption.add",
            Self::SelectPerson { .. } => "view.select",
            Self::DeselectPerson => "view.deselect",
            Self::OpenAdmin => "view.admin_open",
            Self::CloseAdmin => "view.admin_close",
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What a successful transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The snapshot changed.
    Applied,
    /// A task was created under this id.
    TaskCreated(TaskId),
    /// The action referenced something missing, or had nothing to do; the
    /// snapshot is identical to the input.
    Ignored,
}

/// A new snapshot together with what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: StateStore,
    pub effect: Effect,
}

/// Strict-mode and guard failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("no person named '{0}'")]
    PersonNotFound(String),

    #[error("no task with id {0}")]
    TaskNotFound(TaskId),

    #[error("the name '{0}' is already in use")]
    NameTaken(String),

    #[error("{name} has {tickets} ticket(s) to spend")]
    NoTickets { name: String, tickets: i64 },
}

impl TransitionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PersonNotFound(_) => ErrorCode::PersonNotFound,
            Self::TaskNotFound(_) => ErrorCode::TaskNotFound,
            Self::NameTaken(_) => ErrorCode::NameTaken,
            Self::NoTickets { .. } => ErrorCode::NoTickets,
        }
    }
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// One snapshot of the whole tracker.
///
/// Invariants:
/// - every assigned task id of every person exists in the registry;
/// - each `people` key equals that person's name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateStore {
    tasks: TaskRegistry,
    people: BTreeMap<String, Person>,
    selection: Option<String>,
    admin_open: bool,
}

impl StateStore {
    /// An empty store: no tasks, no people, nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a store from loaded parts, restoring both invariants.
    ///
    /// People are keyed by their own name (a later duplicate wins), and
    /// assignments that point at unknown tasks are dropped. Returns the store
    /// and the number of dangling assignments removed.
    #[must_use]
    pub fn from_parts(
        tasks: TaskRegistry,
        people: impl IntoIterator<Item = Person>,
        selection: Option<String>,
        admin_open: bool,
    ) -> (Self, usize) {
        let mut dropped = 0;
        let people = people
            .into_iter()
            .map(|mut person| {
                dropped += person.retain_assigned(|id| tasks.contains(id));
                (person.name().to_string(), person)
            })
            .collect();
        (
            Self {
                tasks,
                people,
                selection,
                admin_open,
            },
            dropped,
        )
    }

    // --- queries ---------------------------------------------------------

    #[must_use]
    pub const fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// People ordered by name.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    #[must_use]
    pub fn person(&self, name: &str) -> Option<&Person> {
        self.people.get(name)
    }

    #[must_use]
    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    /// The raw selection, which may name someone who no longer exists.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The selected person, or `None` when nothing is selected or the
    /// selection is stale.
    #[must_use]
    pub fn selected_person(&self) -> Option<&Person> {
        self.selection.as_deref().and_then(|name| self.people.get(name))
    }

    #[must_use]
    pub const fn is_admin_open(&self) -> bool {
        self.admin_open
    }

    /// Tasks assigned to `name`, in id order. Empty for unknown names.
    #[must_use]
    pub fn assigned_tasks(&self, name: &str) -> Vec<&Task> {
        self.people.get(name).map_or_else(Vec::new, |person| {
            person.assigned().filter_map(|id| self.tasks.get(id)).collect()
        })
    }

    /// Ticket balance of `name` at `now`, or `None` for unknown names.
    #[must_use]
    pub fn tickets_for<Tz: TimeZone>(
        &self,
        name: &str,
        now: &DateTime<Tz>,
        policy: TicketPolicy,
    ) -> Option<i64> {
        self.people
            .get(name)
            .map(|person| ledger::tickets_for(person, now, policy))
    }

    // --- maintenance -----------------------------------------------------

    /// Drop every logged event at or before `cutoff`. Returns how many were
    /// discarded.
    pub fn discard_before(&mut self, cutoff: &crate::calendar::Stamp) -> usize {
        self.people
            .values_mut()
            .map(|person| person.discard_before(cutoff))
            .sum()
    }

    // --- transitions -----------------------------------------------------

    /// Apply `action` under `rules`, producing the next snapshot.
    ///
    /// # Errors
    ///
    /// Only in strict mode or with redemption guarding enabled; see
    /// [`TransitionError`].
    pub fn apply(&self, action: &Action, rules: &Rules) -> Result<Transition, TransitionError> {
        let mut next = self.clone();
        let effect = next.reduce(action, rules)?;
        debug!(action = action.kind(), ?effect, "transition");
        Ok(Transition {
            state: if effect == Effect::Ignored {
                self.clone()
            } else {
                next
            },
            effect,
        })
    }

    fn reduce(&mut self, action: &Action, rules: &Rules) -> Result<Effect, TransitionError> {
        match action {
            Action::AddTask { title } => {
                let id = self
                    .tasks
                    .add(title.as_deref().unwrap_or(PLACEHOLDER_TASK_TITLE));
                Ok(Effect::TaskCreated(id))
            }
            Action::RenameTask { id, title } => {
                if self.tasks.rename(*id, title.as_str()) {
                    Ok(Effect::Applied)
                } else {
                    missing(rules, TransitionError::TaskNotFound(*id))
                }
            }
            Action::RemoveTask { id } => {
                if self.tasks.remove(*id).is_none() {
                    return missing(rules, TransitionError::TaskNotFound(*id));
                }
                for person in self.people.values_mut() {
                    person.unassign(*id);
                }
                Ok(Effect::Applied)
            }
            Action::AddPerson { name } => {
                let name = name.as_deref().unwrap_or(PLACEHOLDER_PERSON_NAME);
                if rules.strict && self.people.contains_key(name) {
                    return Err(TransitionError::NameTaken(name.to_string()));
                }
                self.people.insert(name.to_string(), Person::new(name));
                Ok(Effect::Applied)
            }
            Action::RenamePerson { from, to } => self.rename_person(from, to, rules),
            Action::RemovePerson { name } => {
                if self.people.remove(name).is_none() {
                    return missing(rules, TransitionError::PersonNotFound(name.clone()));
                }
                Ok(Effect::Applied)
            }
            Action::ToggleAssignedTask { name, task } => {
                if !self.tasks.contains(*task) {
                    return missing(rules, TransitionError::TaskNotFound(*task));
                }
                let Some(person) = self.people.get_mut(name) else {
                    return missing(rules, TransitionError::PersonNotFound(name.clone()));
                };
                person.toggle_assigned(*task);
                Ok(Effect::Applied)
            }
            Action::Complete { name, task, at } => {
                if !self.tasks.contains(*task) {
                    return missing(rules, TransitionError::TaskNotFound(*task));
                }
                let Some(person) = self.people.get_mut(name) else {
                    return missing(rules, TransitionError::PersonNotFound(name.clone()));
                };
                person.complete(*task, at);
                Ok(Effect::Applied)
            }
            Action::Uncomplete { name, task, at } => {
                let Some(person) = self.people.get_mut(name) else {
                    return missing(rules, TransitionError::PersonNotFound(name.clone()));
                };
                if person.uncomplete(*task, at) {
                    Ok(Effect::Applied)
                } else {
                    Ok(Effect::Ignored)
                }
            }
            Action::ToggleCompletion { name, task, at } => {
                let Some(person) = self.people.get_mut(name) else {
                    return missing(rules, TransitionError::PersonNotFound(name.clone()));
                };
                if person.uncomplete(*task, at) {
                    return Ok(Effect::Applied);
                }
                if !self.tasks.contains(*task) {
                    return missing(rules, TransitionError::TaskNotFound(*task));
                }
                person.complete(*task, at);
                Ok(Effect::Applied)
            }
            Action::Redeem { name, at } => {
                let Some(person) = self.people.get_mut(name) else {
                    return missing(rules, TransitionError::PersonNotFound(name.clone()));
                };
                if rules.guard_redemptions {
                    let tickets = ledger::tickets_for(person, at, rules.ticket_policy);
                    if tickets <= 0 {
                        return Err(TransitionError::NoTickets {
                            name: name.clone(),
                            tickets,
                        });
                    }
                }
                person.redeem(at);
                Ok(Effect::Applied)
            }
            Action::SelectPerson { name } => {
                if !self.people.contains_key(name) {
                    return missing(rules, TransitionError::PersonNotFound(name.clone()));
                }
                self.selection = Some(name.clone());
                Ok(Effect::Applied)
            }
            Action::DeselectPerson => Ok(set_flag(&mut self.selection, None)),
            Action::OpenAdmin => Ok(set_flag(&mut self.admin_open, true)),
            Action::CloseAdmin => Ok(set_flag(&mut self.admin_open, false)),
        }
    }

    fn rename_person(&mut self, from: &str, to: &str, rules: &Rules) -> Result<Effect, TransitionError> {
        if !self.people.contains_key(from) {
            return missing(rules, TransitionError::PersonNotFound(from.to_string()));
        }
        if from == to {
            return Ok(Effect::Ignored);
        }
        if rules.strict && self.people.contains_key(to) {
            return Err(TransitionError::NameTaken(to.to_string()));
        }
        let Some(mut person) = self.people.remove(from) else {
            return Ok(Effect::Ignored);
        };
        person.set_name(to);
        self.people.insert(to.to_string(), person);
        if self.selection.as_deref() == Some(from) {
            self.selection = Some(to.to_string());
        }
        Ok(Effect::Applied)
    }
}

fn missing(rules: &Rules, err: TransitionError) -> Result<Effect, TransitionError> {
    if rules.strict {
        Err(err)
    } else {
        debug!(%err, "ignoring transition on missing reference");
        Ok(Effect::Ignored)
    }
}

fn set_flag<T: PartialEq>(slot: &mut T, value: T) -> Effect {
    if *slot == value {
        Effect::Ignored
    } else {
        *slot = value;
        Effect::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).expect("valid rfc3339")
    }

    fn lenient() -> Rules {
        Rules::default()
    }

    fn strict() -> Rules {
        Rules {
            strict: true,
            ..Rules::default()
        }
    }

    fn run(state: &StateStore, action: Action) -> StateStore {
        state.apply(&action, &lenient()).expect("lenient never fails").state
    }

    fn household() -> StateStore {
        let mut state = StateStore::new();
        state = run(&state, Action::AddTask { title: Some("Dishes".into()) });
        state = run(&state, Action::AddTask { title: Some("Laundry".into()) });
        for name in ["Billy", "Susan"] {
            state = run(&state, Action::AddPerson { name: Some(name.into()) });
            for task in [1, 2] {
                state = run(
                    &state,
                    Action::ToggleAssignedTask {
                        name: name.into(),
                        task: TaskId::new(task),
                    },
                );
            }
        }
        state
    }

    #[test]
    fn apply_leaves_input_snapshot_untouched() {
        let before = household();
        let copy = before.clone();
        let after = run(&before, Action::RemovePerson { name: "Billy".into() });
        assert_eq!(before, copy);
        assert!(after.person("Billy").is_none());
    }

    #[test]
    fn add_task_reports_new_id_and_uses_placeholder() {
        let t = household()
            .apply(&Action::AddTask { title: None }, &lenient())
            .expect("add task");
        assert_eq!(t.effect, Effect::TaskCreated(TaskId::new(3)));
        assert_eq!(t.state.tasks().title(TaskId::new(3)), Some(PLACEHOLDER_TASK_TITLE));
    }

    #[test]
    fn remove_task_cascades_to_every_person() {
        let state = run(&household(), Action::RemoveTask { id: TaskId::new(1) });
        assert!(!state.tasks().contains(TaskId::new(1)));
        for person in state.people() {
            assert!(!person.is_assigned(TaskId::new(1)));
            assert!(person.is_assigned(TaskId::new(2)));
        }
    }

    #[test]
    fn remove_task_keeps_completion_history() {
        let now = at("2024-04-01T10:00:00+02:00");
        let mut state = run(
            &household(),
            Action::Complete {
                name: "Billy".into(),
                task: TaskId::new(1),
                at: now,
            },
        );
        state = run(&state, Action::RemoveTask { id: TaskId::new(1) });
        let billy = state.person("Billy").expect("billy");
        assert_eq!(billy.completions_for(TaskId::new(1)).len(), 1);
    }

    #[test]
    fn rename_person_rekeys_and_keeps_logs() {
        let now = at("2024-04-01T10:00:00Z");
        let mut state = run(
            &household(),
            Action::Complete {
                name: "Billy".into(),
                task: TaskId::new(2),
                at: now,
            },
        );
        state = run(&state, Action::Redeem { name: "Billy".into(), at: now });
        state = run(&state, Action::SelectPerson { name: "Billy".into() });
        let old = state.person("Billy").expect("billy").clone();

        state = run(
            &state,
            Action::RenamePerson {
                from: "Billy".into(),
                to: "William".into(),
            },
        );
        assert!(state.person("Billy").is_none());
        let william = state.person("William").expect("william");
        assert_eq!(william.name(), "William");
        assert_eq!(william.completions_for(TaskId::new(2)), old.completions_for(TaskId::new(2)));
        assert_eq!(william.redemptions(), old.redemptions());
        assert_eq!(state.selection(), Some("William"));
    }

    #[test]
    fn rename_collision_overwrites_when_lenient() {
        let state = run(
            &household(),
            Action::RenamePerson {
                from: "Billy".into(),
                to: "Susan".into(),
            },
        );
        assert_eq!(state.person_count(), 1);
        assert_eq!(state.person("Susan").map(Person::name), Some("Susan"));
    }

    #[test]
    fn rename_collision_fails_when_strict() {
        let err = household()
            .apply(
                &Action::RenamePerson {
                    from: "Billy".into(),
                    to: "Susan".into(),
                },
                &strict(),
            )
            .expect_err("collision");
        assert_eq!(err, TransitionError::NameTaken("Susan".into()));
        assert_eq!(err.code(), ErrorCode::NameTaken);
    }

    #[test]
    fn add_person_overwrites_existing_when_lenient() {
        let now = at("2024-04-01T10:00:00Z");
        let mut state = run(&household(), Action::Redeem { name: "Susan".into(), at: now });
        state = run(&state, Action::AddPerson { name: Some("Susan".into()) });
        assert_eq!(state.person("Susan"), Some(&Person::new("Susan")));
    }

    #[test]
    fn missing_references_are_ignored_when_lenient() {
        let state = household();
        let now = at("2024-04-01T10:00:00Z");
        let actions = [
            Action::RenameTask {
                id: TaskId::new(42),
                title: "x".into(),
            },
            Action::RemoveTask { id: TaskId::new(42) },
            Action::RemovePerson { name: "Nobody".into() },
            Action::Complete {
                name: "Nobody".into(),
                task: TaskId::new(1),
                at: now,
            },
            Action::Complete {
                name: "Billy".into(),
                task: TaskId::new(42),
                at: now,
            },
            Action::Uncomplete {
                name: "Billy".into(),
                task: TaskId::new(1),
                at: now,
            },
            Action::Redeem {
                name: "Nobody".into(),
                at: now,
            },
            Action::SelectPerson { name: "Nobody".into() },
        ];
        for action in actions {
            let t = state.apply(&action, &lenient()).expect("lenient");
            assert_eq!(t.effect, Effect::Ignored, "{}", action.kind());
            assert_eq!(t.state, state);
        }
    }

    #[test]
    fn missing_references_fail_when_strict() {
        let err = household()
            .apply(&Action::RemovePerson { name: "Nobody".into() }, &strict())
            .expect_err("strict");
        assert_eq!(err.code(), ErrorCode::PersonNotFound);

        let err = household()
            .apply(&Action::RemoveTask { id: TaskId::new(9) }, &strict())
            .expect_err("strict");
        assert_eq!(err, TransitionError::TaskNotFound(TaskId::new(9)));
    }

    #[test]
    fn toggle_completion_keeps_one_per_day() {
        let morning = at("2024-04-01T08:00:00Z");
        let evening = morning + TimeDelta::hours(10);
        let toggle = |state: &StateStore, at| {
            run(
                state,
                Action::ToggleCompletion {
                    name: "Susan".into(),
                    task: TaskId::new(1),
                    at,
                },
            )
        };

        let once = toggle(&household(), morning);
        assert!(once.person("Susan").and_then(|p| p.completion_on(TaskId::new(1), &morning)).is_some());
        let twice = toggle(&once, evening);
        assert_eq!(twice, household());
    }

    #[test]
    fn redeem_is_unguarded_by_default() {
        let now = at("2024-04-01T08:00:00Z");
        let state = run(&household(), Action::Redeem { name: "Billy".into(), at: now });
        assert_eq!(state.tickets_for("Billy", &now, TicketPolicy::Daily), Some(-1));
    }

    #[test]
    fn guarded_redeem_requires_positive_balance() {
        let now = at("2024-04-01T08:00:00Z");
        let rules = Rules {
            guard_redemptions: true,
            ..Rules::default()
        };
        let redeem = Action::Redeem {
            name: "Billy".into(),
            at: now,
        };
        let err = household().apply(&redeem, &rules).expect_err("no tickets");
        assert_eq!(
            err,
            TransitionError::NoTickets {
                name: "Billy".into(),
                tickets: 0
            }
        );

        let earned = run(
            &household(),
            Action::Complete {
                name: "Billy".into(),
                task: TaskId::new(1),
                at: now,
            },
        );
        let spent = earned.apply(&redeem, &rules).expect("one ticket").state;
        assert_eq!(spent.tickets_for("Billy", &now, TicketPolicy::Daily), Some(0));
    }

    #[test]
    fn stale_selection_reads_as_nothing_selected() {
        let mut state = run(&household(), Action::SelectPerson { name: "Susan".into() });
        state = run(&state, Action::RemovePerson { name: "Susan".into() });
        assert_eq!(state.selection(), Some("Susan"));
        assert!(state.selected_person().is_none());

        state = run(&state, Action::DeselectPerson);
        assert_eq!(state.selection(), None);
    }

    #[test]
    fn admin_flag_toggles() {
        let state = household();
        let opened = state.apply(&Action::OpenAdmin, &lenient()).expect("open");
        assert_eq!(opened.effect, Effect::Applied);
        assert!(opened.state.is_admin_open());
        let again = opened.state.apply(&Action::OpenAdmin, &lenient()).expect("open");
        assert_eq!(again.effect, Effect::Ignored);
        let closed = run(&opened.state, Action::CloseAdmin);
        assert!(!closed.is_admin_open());
    }

    #[test]
    fn from_parts_drops_dangling_assignments() {
        let mut tasks = TaskRegistry::new();
        tasks.add("Dishes");
        let mut billy = Person::new("Billy");
        billy.toggle_assigned(TaskId::new(1));
        billy.toggle_assigned(TaskId::new(5));

        let (state, dropped) = StateStore::from_parts(tasks, [billy], None, false);
        assert_eq!(dropped, 1);
        let assigned: Vec<_> = state.person("Billy").expect("billy").assigned().collect();
        assert_eq!(assigned, vec![TaskId::new(1)]);
    }
}
