use crate::calendar::{self, Stamp};
use crate::model::task::TaskId;
use chrono::{DateTime, TimeZone};
use std::collections::{BTreeMap, BTreeSet};

/// Name given to people created from the admin view without a name.
pub const PLACEHOLDER_PERSON_NAME: &str = "new Person";

/// One member of the household: assigned tasks plus completion and
/// redemption logs.
///
/// Completion logs are append-only per task; an empty log is never kept, so
/// two people with the same history compare equal regardless of how they got
/// there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    name: String,
    assigned: BTreeSet<TaskId>,
    completions: BTreeMap<TaskId, Vec<Stamp>>,
    redemptions: Vec<Stamp>,
}

impl Person {
    /// A person with no assignments and empty logs.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assigned: BTreeSet::new(),
            completions: BTreeMap::new(),
            redemptions: Vec::new(),
        }
    }

    /// Rebuild a person from stored parts. Timestamps are normalized and
    /// empty completion logs dropped.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        assigned: impl IntoIterator<Item = TaskId>,
        completions: impl IntoIterator<Item = (TaskId, Vec<Stamp>)>,
        redemptions: Vec<Stamp>,
    ) -> Self {
        let completions = completions
            .into_iter()
            .filter(|(_, log)| !log.is_empty())
            .map(|(id, log)| (id, log.iter().map(calendar::stamp).collect()))
            .collect();
        Self {
            name: name.into(),
            assigned: assigned.into_iter().collect(),
            completions,
            redemptions: redemptions.iter().map(calendar::stamp).collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // --- assignments -----------------------------------------------------

    #[must_use]
    pub fn is_assigned(&self, task: TaskId) -> bool {
        self.assigned.contains(&task)
    }

    pub fn assigned(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.assigned.iter().copied()
    }

    /// Add `task` if absent, remove it if present. Returns whether the task
    /// is assigned afterwards.
    pub fn toggle_assigned(&mut self, task: TaskId) -> bool {
        if self.assigned.remove(&task) {
            false
        } else {
            self.assigned.insert(task);
            true
        }
    }

    pub fn unassign(&mut self, task: TaskId) -> bool {
        self.assigned.remove(&task)
    }

    /// Keep only assignments accepted by `keep`. Returns how many were dropped.
    pub(crate) fn retain_assigned(&mut self, mut keep: impl FnMut(TaskId) -> bool) -> usize {
        let before = self.assigned.len();
        self.assigned.retain(|id| keep(*id));
        before - self.assigned.len()
    }

    // --- completions -----------------------------------------------------

    /// Append a completion of `task` at `at`. Append-only: a second call on
    /// the same day records a second entry.
    pub fn complete<Tz: TimeZone>(&mut self, task: TaskId, at: &DateTime<Tz>) {
        self.completions
            .entry(task)
            .or_default()
            .push(calendar::stamp(at));
    }

    /// Remove one completion of `task` recorded on `now`'s calendar day.
    /// Returns `false` (and changes nothing) when there is none.
    pub fn uncomplete<Tz: TimeZone>(&mut self, task: TaskId, now: &DateTime<Tz>) -> bool {
        let Some(log) = self.completions.get_mut(&task) else {
            return false;
        };
        let Some(index) = log.iter().position(|when| calendar::same_day(when, now)) else {
            return false;
        };
        log.remove(index);
        if log.is_empty() {
            self.completions.remove(&task);
        }
        true
    }

    /// The first completion of `task` on `now`'s calendar day, if any.
    #[must_use]
    pub fn completion_on<Tz: TimeZone>(&self, task: TaskId, now: &DateTime<Tz>) -> Option<Stamp> {
        self.completions_for(task)
            .iter()
            .find(|when| calendar::same_day(when, now))
            .copied()
    }

    #[must_use]
    pub fn completions_for(&self, task: TaskId) -> &[Stamp] {
        self.completions
            .get(&task)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Per-task completion logs, ordered by task id.
    pub fn completions(&self) -> impl Iterator<Item = (TaskId, &[Stamp])> {
        self.completions
            .iter()
            .map(|(id, log)| (*id, log.as_slice()))
    }

    /// Every completion timestamp, flattened across tasks.
    pub fn all_completions(&self) -> impl Iterator<Item = &Stamp> {
        self.completions.values().flatten()
    }

    // --- redemptions -----------------------------------------------------

    /// Record spending one ticket at `at`. No balance check.
    pub fn redeem<Tz: TimeZone>(&mut self, at: &DateTime<Tz>) {
        self.redemptions.push(calendar::stamp(at));
    }

    #[must_use]
    pub fn redemptions(&self) -> &[Stamp] {
        &self.redemptions
    }

    /// Drop every logged timestamp at or before `cutoff`. Returns how many
    /// entries were discarded.
    pub fn discard_before(&mut self, cutoff: &Stamp) -> usize {
        let mut dropped = 0;
        for log in self.completions.values_mut() {
            let before = log.len();
            log.retain(|when| when > cutoff);
            dropped += before - log.len();
        }
        self.completions.retain(|_, log| !log.is_empty());

        let before = self.redemptions.len();
        self.redemptions.retain(|when| when > cutoff);
        dropped + before - self.redemptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    #[test]
    fn toggle_assigned_twice_is_identity() {
        let mut billy = Person::new("Billy");
        let original = billy.clone();
        assert!(billy.toggle_assigned(TaskId::new(3)));
        assert!(billy.is_assigned(TaskId::new(3)));
        assert!(!billy.toggle_assigned(TaskId::new(3)));
        assert_eq!(billy, original);
    }

    #[test]
    fn complete_is_append_only() {
        let mut p = Person::new("Susan");
        let now = at("2024-05-01T09:00:00Z");
        p.complete(TaskId::new(1), &now);
        p.complete(TaskId::new(1), &now);
        assert_eq!(p.completions_for(TaskId::new(1)).len(), 2);
    }

    #[test]
    fn uncomplete_removes_only_todays_entry() {
        let mut p = Person::new("Susan");
        let yesterday = at("2024-05-01T09:00:00Z");
        let today = at("2024-05-02T09:00:00Z");
        p.complete(TaskId::new(1), &yesterday);
        p.complete(TaskId::new(1), &today);

        assert!(p.uncomplete(TaskId::new(1), &(today + TimeDelta::hours(3))));
        assert_eq!(p.completions_for(TaskId::new(1)), &[calendar::stamp(&yesterday)]);
    }

    #[test]
    fn uncomplete_without_match_is_noop() {
        let mut p = Person::new("Theodore");
        p.complete(TaskId::new(2), &at("2024-05-01T09:00:00Z"));
        let before = p.clone();

        assert!(!p.uncomplete(TaskId::new(2), &at("2024-05-03T09:00:00Z")));
        assert!(!p.uncomplete(TaskId::new(9), &at("2024-05-01T09:00:00Z")));
        assert_eq!(p, before);
    }

    #[test]
    fn last_uncomplete_drops_empty_log() {
        let mut p = Person::new("Theodore");
        let now = at("2024-05-01T09:00:00Z");
        p.complete(TaskId::new(2), &now);
        p.uncomplete(TaskId::new(2), &now);
        assert_eq!(p, Person::new("Theodore"));
    }

    #[test]
    fn discard_before_applies_to_both_logs() {
        let mut p = Person::new("Billy");
        p.complete(TaskId::new(1), &at("2024-01-01T00:00:00Z"));
        p.complete(TaskId::new(1), &at("2024-01-10T00:00:00Z"));
        p.redeem(&at("2024-01-02T00:00:00Z"));
        p.redeem(&at("2024-01-11T00:00:00Z"));

        let dropped = p.discard_before(&at("2024-01-05T00:00:00Z"));
        assert_eq!(dropped, 2);
        assert_eq!(p.all_completions().count(), 1);
        assert_eq!(p.redemptions().len(), 1);
    }
}
