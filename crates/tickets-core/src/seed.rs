//! The built-in household used on first run or when stored state is unusable.

use crate::model::{Person, TaskId, TaskRegistry};
use crate::store::StateStore;

/// Tasks every child gets.
pub const SHARED_TASKS: [&str; 2] = ["Dressed / Brush Teeth / Pick-up Room", "Be Active 30 min"];

/// Extra tasks for the older children.
pub const BIG_KID_TASKS: [&str; 3] = ["Read 30 min", "Create 30 min", "Mom's Choice"];

/// Billy and Susan get every task, Theodore the shared ones. The admin view
/// starts open so the household can be edited right away.
#[must_use]
pub fn default_state() -> StateStore {
    let mut tasks = TaskRegistry::new();
    let shared: Vec<TaskId> = SHARED_TASKS.iter().map(|title| tasks.add(*title)).collect();
    let big_kid: Vec<TaskId> = BIG_KID_TASKS.iter().map(|title| tasks.add(*title)).collect();

    let everything = || shared.iter().chain(big_kid.iter()).copied();
    let people = [
        person("Billy", everything()),
        person("Susan", everything()),
        person("Theodore", shared.iter().copied()),
    ];

    let (state, _) = StateStore::from_parts(tasks, people, None, true);
    state
}

fn person(name: &str, tasks: impl IntoIterator<Item = TaskId>) -> Person {
    let mut person = Person::new(name);
    for id in tasks {
        person.toggle_assigned(id);
    }
    person
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_five_tasks_and_three_people() {
        let state = default_state();
        assert_eq!(state.tasks().len(), 5);
        let names: Vec<_> = state.people().map(Person::name).collect();
        assert_eq!(names, vec!["Billy", "Susan", "Theodore"]);
        assert!(state.is_admin_open());
        assert_eq!(state.selection(), None);
    }

    #[test]
    fn theodore_only_gets_shared_tasks() {
        let state = default_state();
        let titles: Vec<_> = state
            .assigned_tasks("Theodore")
            .into_iter()
            .map(|task| task.title.as_str())
            .collect();
        assert_eq!(titles, SHARED_TASKS.to_vec());
        assert_eq!(state.assigned_tasks("Billy").len(), 5);
    }

    #[test]
    fn seed_logs_start_empty() {
        for person in default_state().people() {
            assert_eq!(person.all_completions().count(), 0);
            assert!(person.redemptions().is_empty());
        }
    }
}
