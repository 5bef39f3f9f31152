//! Derived ticket counts.
//!
//! Tickets are never stored. They are recomputed from a person's completion
//! and redemption logs every time they are needed.

use crate::calendar;
use crate::model::Person;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Which log entries count towards the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPolicy {
    /// Only entries on the reference instant's calendar day.
    #[default]
    Daily,
    /// Every entry ever logged.
    Cumulative,
}

impl TicketPolicy {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Cumulative => "cumulative",
        }
    }
}

impl fmt::Display for TicketPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPolicy {
    type Err = crate::model::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "cumulative" | "all" => Ok(Self::Cumulative),
            _ => Err(crate::model::ParseEnumError {
                expected: "ticket policy",
                got: s.to_string(),
            }),
        }
    }
}

/// Spendable tickets for `person` at `now`: completions minus redemptions,
/// filtered to `now`'s day under [`TicketPolicy::Daily`].
///
/// The result may be negative; gating redemption on a positive balance is
/// the caller's concern.
#[must_use]
pub fn tickets_for<Tz: TimeZone>(person: &Person, now: &DateTime<Tz>, policy: TicketPolicy) -> i64 {
    let (earned, spent) = match policy {
        TicketPolicy::Daily => (
            person
                .all_completions()
                .filter(|when| calendar::same_day(when, now))
                .count(),
            person
                .redemptions()
                .iter()
                .filter(|when| calendar::same_day(when, now))
                .count(),
        ),
        TicketPolicy::Cumulative => (person.all_completions().count(), person.redemptions().len()),
    };
    to_i64(earned) - to_i64(spent)
}

fn to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskId;
    use chrono::Utc;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    fn sample() -> Person {
        let mut p = Person::new("Billy");
        p.complete(TaskId::new(1), &at("2024-06-01T08:00:00Z"));
        p.complete(TaskId::new(2), &at("2024-06-01T09:00:00Z"));
        p.complete(TaskId::new(1), &at("2024-06-02T08:00:00Z"));
        p.redeem(&at("2024-06-01T18:00:00Z"));
        p
    }

    #[test]
    fn daily_counts_only_reference_day() {
        let p = sample();
        assert_eq!(tickets_for(&p, &at("2024-06-01T20:00:00Z"), TicketPolicy::Daily), 1);
        assert_eq!(tickets_for(&p, &at("2024-06-02T20:00:00Z"), TicketPolicy::Daily), 1);
        assert_eq!(tickets_for(&p, &at("2024-06-03T20:00:00Z"), TicketPolicy::Daily), 0);
    }

    #[test]
    fn cumulative_ignores_day() {
        let p = sample();
        assert_eq!(
            tickets_for(&p, &at("2030-01-01T00:00:00Z"), TicketPolicy::Cumulative),
            2
        );
    }

    #[test]
    fn balance_may_go_negative() {
        let mut p = Person::new("Caroline");
        let now = at("2024-06-01T08:00:00Z");
        p.redeem(&now);
        assert_eq!(tickets_for(&p, &now, TicketPolicy::Daily), -1);
    }

    #[test]
    fn policy_parses_aliases() {
        assert_eq!("Daily".parse::<TicketPolicy>().ok(), Some(TicketPolicy::Daily));
        assert_eq!("all".parse::<TicketPolicy>().ok(), Some(TicketPolicy::Cumulative));
        assert!("weekly".parse::<TicketPolicy>().is_err());
    }
}
