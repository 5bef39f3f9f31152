pub mod person;
pub mod task;

pub use person::{PLACEHOLDER_PERSON_NAME, Person};
pub use task::{PLACEHOLDER_TASK_TITLE, Task, TaskId, TaskRegistry};

use std::fmt;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}
