//! Per-person activity history for the admin view.

use crate::calendar::{self, Stamp};
use crate::model::{Person, TaskId, TaskRegistry};
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;
use std::fmt;

/// Label used for completions whose task has since been removed.
pub const REMOVED_TASK_LABEL: &str = "removed task";

/// What happened in one activity entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityKind {
    /// `title` is `None` when the task no longer exists.
    Completed { task: TaskId, title: Option<String> },
    Redeemed,
}

/// One logged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub when: Stamp,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActivityKind::Completed { title, .. } => {
                write!(f, "Completed: {}", title.as_deref().unwrap_or(REMOVED_TASK_LABEL))
            }
            ActivityKind::Redeemed => f.write_str("Redeemed a ticket"),
        }
    }
}

/// Every completion and redemption of `person`, newest first.
#[must_use]
pub fn activity(person: &Person, tasks: &TaskRegistry) -> Vec<ActivityEntry> {
    let completions = person.completions().flat_map(|(task, log)| {
        let title = tasks.title(task).map(str::to_string);
        log.iter().map(move |when| ActivityEntry {
            when: *when,
            kind: ActivityKind::Completed {
                task,
                title: title.clone(),
            },
        })
    });
    let redemptions = person.redemptions().iter().map(|when| ActivityEntry {
        when: *when,
        kind: ActivityKind::Redeemed,
    });

    let mut entries: Vec<_> = completions.chain(redemptions).collect();
    entries.sort_by(|a, b| b.when.cmp(&a.when));
    entries
}

/// Split newest-first `entries` into consecutive runs sharing a calendar
/// day, as seen from `now`'s timezone.
#[must_use]
pub fn group_by_day<'a, Tz: TimeZone>(
    entries: &'a [ActivityEntry],
    now: &DateTime<Tz>,
) -> Vec<(NaiveDate, &'a [ActivityEntry])> {
    let mut groups = Vec::new();
    let mut start = 0;
    for index in 1..=entries.len() {
        let boundary = index == entries.len()
            || calendar::day_of(&entries[index].when, now)
                != calendar::day_of(&entries[start].when, now);
        if boundary {
            groups.push((
                calendar::day_of(&entries[start].when, now),
                &entries[start..index],
            ));
            start = index;
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    fn fixture() -> (Person, TaskRegistry) {
        let mut tasks = TaskRegistry::new();
        let dishes = tasks.add("Dishes");
        let mut p = Person::new("Billy");
        p.complete(dishes, &at("2024-02-01T08:00:00Z"));
        p.complete(TaskId::new(9), &at("2024-02-02T08:00:00Z"));
        p.redeem(&at("2024-02-02T09:00:00Z"));
        (p, tasks)
    }

    #[test]
    fn entries_are_newest_first_with_labels() {
        let (p, tasks) = fixture();
        let entries = activity(&p, &tasks);
        let lines: Vec<_> = entries.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "Redeemed a ticket",
                "Completed: removed task",
                "Completed: Dishes",
            ]
        );
    }

    #[test]
    fn grouping_splits_on_day_change() {
        let (p, tasks) = fixture();
        let entries = activity(&p, &tasks);
        let groups = group_by_day(&entries, &at("2024-02-03T00:00:00Z"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, NaiveDate::from_ymd_opt(2024, 2, 1).expect("date"));
    }

    #[test]
    fn grouping_empty_is_empty() {
        assert!(group_by_day(&[], &at("2024-02-03T00:00:00Z")).is_empty());
    }

    #[test]
    fn entry_serializes_with_kind_tag() {
        let (p, tasks) = fixture();
        let entries = activity(&p, &tasks);
        let json = serde_json::to_value(&entries[0]).expect("serialize");
        assert_eq!(json["kind"], "redeemed");
        assert_eq!(json["when"], "2024-02-02T09:00:00Z");
    }
}
