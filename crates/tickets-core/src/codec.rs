//! JSON snapshot codec.
//!
//! The stored document keeps the shape the household's browser storage has
//! always used:
//!
//! ```json
//! {
//!   "tasks": { "1": "Read 30 min" },
//!   "people": {
//!     "Billy": {
//!       "tasks": [1],
//!       "taskCompletions": { "1": ["2024-06-01T08:00:00.000Z"] },
//!       "redemptions": []
//!     }
//!   },
//!   "inAdmin": false,
//!   "selectedPersonName": "Billy"
//! }
//! ```
//!
//! Timestamps are ISO-8601 with millisecond precision in UTC. Assigned task
//! ids may be numbers or numeric strings; older snapshots wrote strings.

use crate::calendar::Stamp;
use crate::model::{Person, TaskId, TaskRegistry};
use crate::store::StateStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a stored snapshot cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not JSON, or JSON of the wrong shape.
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// A task id key or reference that is not a non-negative integer.
    #[error("invalid task id '{0}'")]
    InvalidTaskId(String),
}

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub state: StateStore,
    /// Assignments dropped because their task no longer exists.
    pub dangling_assignments: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Serialize `state` to the stored JSON document.
///
/// # Errors
///
/// Propagates `serde_json` failures.
pub fn encode(state: &StateStore) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&WireState::from(state))
}

/// Parse a stored JSON document back into a [`StateStore`].
///
/// # Errors
///
/// Returns [`DecodeError`] for anything that is not a well-formed snapshot.
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    let wire: WireState = serde_json::from_slice(bytes)?;

    let mut tasks = TaskRegistry::new();
    for (key, title) in wire.tasks {
        tasks.insert(parse_task_id(&key)?, title);
    }

    let mut people = Vec::with_capacity(wire.people.len());
    for (name, person) in wire.people {
        let assigned = person
            .tasks
            .into_iter()
            .map(WireTaskId::into_task_id)
            .collect::<Result<Vec<_>, _>>()?;
        let completions = person
            .task_completions
            .into_iter()
            .map(|(key, log)| -> Result<_, DecodeError> {
                Ok((parse_task_id(&key)?, unwrap_stamps(log)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        people.push(Person::from_parts(
            name,
            assigned,
            completions,
            unwrap_stamps(person.redemptions),
        ));
    }

    let (state, dangling_assignments) =
        StateStore::from_parts(tasks, people, wire.selected_person_name, wire.in_admin);
    Ok(Decoded {
        state,
        dangling_assignments,
    })
}

fn parse_task_id(raw: &str) -> Result<TaskId, DecodeError> {
    raw.parse()
        .map_err(|_| DecodeError::InvalidTaskId(raw.to_string()))
}

fn unwrap_stamps(log: Vec<WireStamp>) -> Vec<Stamp> {
    log.into_iter().map(|stamp| stamp.0).collect()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireState {
    tasks: BTreeMap<String, String>,
    people: BTreeMap<String, WirePerson>,
    #[serde(default)]
    in_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_person_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePerson {
    #[serde(default)]
    tasks: Vec<WireTaskId>,
    #[serde(default)]
    task_completions: BTreeMap<String, Vec<WireStamp>>,
    #[serde(default)]
    redemptions: Vec<WireStamp>,
}

impl From<&StateStore> for WireState {
    fn from(state: &StateStore) -> Self {
        Self {
            tasks: state
                .tasks()
                .iter()
                .map(|task| (task.id.to_string(), task.title.clone()))
                .collect(),
            people: state
                .people()
                .map(|person| (person.name().to_string(), WirePerson::from(person)))
                .collect(),
            in_admin: state.is_admin_open(),
            selected_person_name: state.selection().map(str::to_string),
        }
    }
}

impl From<&Person> for WirePerson {
    fn from(person: &Person) -> Self {
        Self {
            tasks: person.assigned().map(WireTaskId::Number).collect(),
            task_completions: person
                .completions()
                .map(|(id, log)| (id.to_string(), log.iter().copied().map(WireStamp).collect()))
                .collect(),
            redemptions: person.redemptions().iter().copied().map(WireStamp).collect(),
        }
    }
}

/// Task id reference: `1` or `"1"`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireTaskId {
    Number(TaskId),
    Text(String),
}

impl WireTaskId {
    fn into_task_id(self) -> Result<TaskId, DecodeError> {
        match self {
            Self::Number(id) => Ok(id),
            Self::Text(raw) => parse_task_id(&raw),
        }
    }
}

/// A timestamp written as `YYYY-MM-DDTHH:MM:SS.sssZ`.
#[derive(Debug, Clone, Copy)]
struct WireStamp(Stamp);

impl Serialize for WireStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl<'de> Deserialize<'de> for WireStamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| Self(at.with_timezone(&Utc)))
            .map_err(|err| serde::de::Error::custom(format!("invalid timestamp '{raw}': {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::default_state;
    use crate::store::{Action, Rules};
    use chrono::FixedOffset;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).expect("valid rfc3339")
    }

    #[test]
    fn encodes_millisecond_utc_timestamps() {
        let state = default_state()
            .apply(
                &Action::Redeem {
                    name: "Billy".into(),
                    at: at("2024-06-01T10:00:00.123456+02:00"),
                },
                &Rules::default(),
            )
            .expect("redeem")
            .state;
        let json: serde_json::Value =
            serde_json::from_slice(&encode(&state).expect("encode")).expect("json");
        assert_eq!(
            json["people"]["Billy"]["redemptions"][0],
            "2024-06-01T08:00:00.123Z"
        );
        assert_eq!(json["tasks"]["1"], "Dressed / Brush Teeth / Pick-up Room");
        assert_eq!(json["inAdmin"], true);
    }

    #[test]
    fn decodes_string_task_ids() {
        let doc = br#"{
            "tasks": {"1": "Dishes", "2": "Trash"},
            "people": {
                "Susan": {
                    "tasks": ["1", 2],
                    "taskCompletions": {"1": ["2024-06-01T08:00:00.000Z"], "2": []},
                    "redemptions": ["2024-06-01T09:00:00.000Z"]
                }
            },
            "inAdmin": false
        }"#;
        let decoded = decode(doc).expect("decode");
        let susan = decoded.state.person("Susan").expect("susan");
        assert!(susan.is_assigned(TaskId::new(1)));
        assert!(susan.is_assigned(TaskId::new(2)));
        assert_eq!(susan.completions().count(), 1);
        assert_eq!(susan.redemptions().len(), 1);
        assert_eq!(decoded.dangling_assignments, 0);
    }

    #[test]
    fn add_task_after_stored_u32_max_id_does_not_clobber() {
        let decoded = decode(br#"{"tasks": {"4294967295": "x"}, "people": {}}"#).expect("decode");
        let t = decoded
            .state
            .apply(&Action::AddTask { title: None }, &Rules::default())
            .expect("add task");
        assert_eq!(t.state.tasks().len(), 2);
        assert_eq!(t.state.tasks().title(TaskId::new(u32::MAX)), Some("x"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let decoded = decode(br#"{"tasks": {}, "people": {"Caroline": {}}}"#).expect("decode");
        assert!(!decoded.state.is_admin_open());
        assert_eq!(decoded.state.person("Caroline"), Some(&Person::new("Caroline")));
    }

    #[test]
    fn dangling_assignments_are_counted_and_dropped() {
        let doc = br#"{"tasks": {"1": "Dishes"}, "people": {"Billy": {"tasks": [1, 3]}}}"#;
        let decoded = decode(doc).expect("decode");
        assert_eq!(decoded.dangling_assignments, 1);
        assert!(!decoded.state.person("Billy").expect("billy").is_assigned(TaskId::new(3)));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(decode(b"not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode(b"[]"), Err(DecodeError::Json(_))));
        assert!(matches!(
            decode(br#"{"tasks": {"one": "x"}, "people": {}}"#),
            Err(DecodeError::InvalidTaskId(id)) if id == "one"
        ));
        assert!(matches!(
            decode(br#"{"tasks": {}, "people": {"B": {"redemptions": ["yesterday"]}}}"#),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn round_trip_preserves_selection_and_logs() {
        let rules = Rules::default();
        let now = at("2024-06-01T08:00:00Z");
        let mut state = default_state();
        for action in [
            Action::Complete {
                name: "Theodore".into(),
                task: TaskId::new(2),
                at: now,
            },
            Action::Redeem {
                name: "Theodore".into(),
                at: now,
            },
            Action::SelectPerson {
                name: "Theodore".into(),
            },
            Action::CloseAdmin,
        ] {
            state = state.apply(&action, &rules).expect("apply").state;
        }

        let decoded = decode(&encode(&state).expect("encode")).expect("decode");
        assert_eq!(decoded.state, state);
    }
}
