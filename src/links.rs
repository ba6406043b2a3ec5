//! Best-effort lookup of ids stored on one entity that point into another
//! collection. Nothing here enforces integrity: a dangling id resolves to
//! `None` and callers simply omit the link.

use crate::models::{Goal, Habit, Reflection, Reminder, Task, TimeEntry};
use crate::store::{Entity, EntityId, EntityStore};

pub fn resolve<T: Entity>(store: &EntityStore<T>, id: Option<EntityId>) -> Option<&T> {
    let id = id?;
    let found = store.get(id);
    if found.is_none() {
        tracing::trace!(collection = T::COLLECTION, id, "dangling reference");
    }
    found
}

pub fn reminder_task<'a>(reminder: &Reminder, tasks: &'a EntityStore<Task>) -> Option<&'a Task> {
    resolve(tasks, reminder.task_id)
}

pub fn reflection_goal<'a>(reflection: &Reflection, goals: &'a EntityStore<Goal>) -> Option<&'a Goal> {
    resolve(goals, reflection.linked_goal_id)
}

pub fn reflection_habit<'a>(
    reflection: &Reflection,
    habits: &'a EntityStore<Habit>,
) -> Option<&'a Habit> {
    resolve(habits, reflection.linked_habit_id)
}

pub fn time_entry_task<'a>(entry: &TimeEntry, tasks: &'a EntityStore<Task>) -> Option<&'a Task> {
    resolve(tasks, Some(entry.task_id))
}

/// Title of the linked entity, or an empty string when the link is dangling
pub fn link_label<T: Entity>(target: Option<&T>) -> &str {
    target.map(|t| t.title()).unwrap_or_default()
}
