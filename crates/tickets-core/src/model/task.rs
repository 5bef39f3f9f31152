use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, num::ParseIntError, str::FromStr};

/// Title given to tasks created from the admin view without a name.
pub const PLACEHOLDER_TASK_TITLE: &str = "new Task";

/// Stable identifier of a task. Assigned as `max + 1`, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for TaskId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// A choreable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
}

/// The canonical set of tasks, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }

    /// The id the next [`add`](Self::add) will assign.
    ///
    /// Normally one past the largest id. Once the largest id is `u32::MAX`
    /// the lowest free id is used instead.
    #[must_use]
    pub fn next_id(&self) -> TaskId {
        let Some(last) = self.tasks.keys().next_back() else {
            return TaskId(1);
        };
        last.0
            .checked_add(1)
            .map_or_else(|| self.lowest_free_id(), TaskId)
    }

    fn lowest_free_id(&self) -> TaskId {
        (1..=u32::MAX)
            .map(TaskId)
            .find(|id| !self.tasks.contains_key(id))
            .unwrap_or(TaskId(0))
    }

    /// Insert a task under the next unused id and return that id.
    pub fn add(&mut self, title: impl Into<String>) -> TaskId {
        let id = self.next_id();
        self.tasks.insert(
            id,
            Task {
                id,
                title: title.into(),
            },
        );
        id
    }

    /// Insert a task under an explicit id, replacing any previous entry.
    ///
    /// Used when rebuilding a registry from a stored snapshot.
    pub fn insert(&mut self, id: TaskId, title: impl Into<String>) {
        self.tasks.insert(
            id,
            Task {
                id,
                title: title.into(),
            },
        );
    }

    /// Replace the title of `id`. Returns `false` when the id is unknown,
    /// in which case the registry is left untouched.
    pub fn rename(&mut self, id: TaskId, title: impl Into<String>) -> bool {
        match self.tasks.get_mut(&id) {
            Some(task) => {
                task.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Delete `id`. Cascading the removal through assignments is the
    /// caller's job.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    #[must_use]
    pub fn title(&self, id: TaskId) -> Option<&str> {
        self.tasks.get(&id).map(|task| task.title.as_str())
    }

    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
