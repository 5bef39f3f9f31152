//! Calendar-day helpers.
//!
//! Event timestamps are stored in UTC with millisecond precision. Whether two
//! instants fall on the "same day" is always judged in the timezone of the
//! reference instant (`now`), so a completion at 23:30 local time counts for
//! that local day even when UTC has already rolled over.

use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};

/// A stored event timestamp.
pub type Stamp = DateTime<Utc>;

/// Normalize an instant for storage: UTC, truncated to whole milliseconds.
#[must_use]
pub fn stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> Stamp {
    at.with_timezone(&Utc).trunc_subsecs(3)
}

/// The calendar day of `stamp` as seen from `now`'s timezone.
#[must_use]
pub fn day_of<Tz: TimeZone>(stamp: &Stamp, now: &DateTime<Tz>) -> NaiveDate {
    stamp.with_timezone(&now.timezone()).date_naive()
}

/// True when `stamp` falls on the same calendar day as `now`, in `now`'s timezone.
#[must_use]
pub fn same_day<Tz: TimeZone>(stamp: &Stamp, now: &DateTime<Tz>) -> bool {
    day_of(stamp, now) == now.date_naive()
}
