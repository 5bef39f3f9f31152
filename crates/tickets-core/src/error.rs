use std::fmt;

/// Machine-readable error codes surfaced by the CLI and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    PersonNotFound,
    TaskNotFound,
    NameTaken,
    NoTickets,
    CorruptSnapshot,
    SnapshotWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::PersonNotFound => "E2001",
            Self::TaskNotFound => "E2002",
            Self::NameTaken => "E2003",
            Self::NoTickets => "E2004",
            Self::CorruptSnapshot => "E3001",
            Self::SnapshotWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::PersonNotFound => "Person not found",
            Self::TaskNotFound => "Task not found",
            Self::NameTaken => "Name already in use",
            Self::NoTickets => "No tickets to spend",
            Self::CorruptSnapshot => "Stored state could not be decoded",
            Self::SnapshotWriteFailed => "State file write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in tickets/config.toml and retry."),
            Self::PersonNotFound => Some("Run `tk people` to list known names."),
            Self::TaskNotFound => Some("Run `tk task list` to see task ids."),
            Self::NameTaken => Some("Pick a different name, or disable [rules] strict."),
            Self::NoTickets => Some("Finish a task first, or pass --force."),
            Self::CorruptSnapshot => None,
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `tk` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
