use std::rc::Rc;

use chrono::{Duration, NaiveDate};
use todo_pro::metrics::{completion_percentage, habit_streak};
use todo_pro::models::{Goal, GoalPatch, Habit, Note, NotePatch, Task, TaskPatch, TaskTag};
use todo_pro::storage::{MemoryStorage, SlotStorage};
use todo_pro::{Entity, EntityStore};

fn empty_tasks(storage: Rc<MemoryStorage>) -> EntityStore<Task> {
    EntityStore::with_items(Vec::new(), storage)
}

fn titles(store: &EntityStore<Task>) -> Vec<String> {
    store.all().iter().map(|t| t.title.clone()).collect()
}

#[test]
fn created_entity_is_found_exactly_once() {
    let mut store = empty_tasks(Rc::new(MemoryStorage::new()));
    let mut ids = Vec::new();
    for title in ["one", "two", "three", "four"] {
        ids.push(store.create(TaskPatch::titled(title)).id);
    }
    for id in ids {
        assert_eq!(store.filter(|t| t.id == id).len(), 1);
    }
}

#[test]
fn ids_stay_unique_when_created_in_a_burst() {
    let mut store: EntityStore<Note> =
        EntityStore::with_items(Vec::new(), Rc::new(MemoryStorage::new()));
    let ids: Vec<i64> = (0..50)
        .map(|i| {
            store
                .create(NotePatch {
                    title: Some(format!("note {i}")),
                    ..NotePatch::default()
                })
                .id
        })
        .collect();
    let mut sorted = ids.clone();
    sorted.dedup();
    assert_eq!(sorted.len(), 50);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn update_changes_only_the_patched_field() {
    let mut store = empty_tasks(Rc::new(MemoryStorage::new()));
    let created = store.create(TaskPatch {
        title: Some("Plan trip".into()),
        due_date: Some(NaiveDate::from_ymd_opt(2024, 8, 1)),
        tag: Some(TaskTag::Urgent),
        ..TaskPatch::default()
    });

    assert!(store.update(created.id, TaskPatch::titled("Plan holiday")));

    let updated = store.filter(|t| t.id == created.id).remove(0);
    assert_eq!(updated.title, "Plan holiday");
    assert_eq!(
        Task {
            title: created.title.clone(),
            ..updated
        },
        created
    );
}

#[test]
fn update_of_missing_id_changes_nothing() {
    let storage = Rc::new(MemoryStorage::new());
    let mut store = empty_tasks(storage.clone());
    store.create(TaskPatch::titled("a"));
    store.create(TaskPatch::titled("b"));
    let before = store.all().to_vec();
    let slot_before = storage.read(Task::COLLECTION).unwrap();

    assert!(!store.update(-1, TaskPatch::titled("ghost")));
    assert!(!store.update_with(-1, |t| t.completed = true));

    assert_eq!(store.all(), before.as_slice());
    assert_eq!(storage.read(Task::COLLECTION).unwrap(), slot_before);
}

#[test]
fn removed_entity_is_gone_and_second_remove_is_noop() {
    let mut store = empty_tasks(Rc::new(MemoryStorage::new()));
    let keep = store.create(TaskPatch::titled("keep"));
    let drop = store.create(TaskPatch::titled("drop"));

    assert!(store.remove(drop.id));
    assert!(store.get(drop.id).is_none());
    assert!(store.filter(|t| t.id == drop.id).is_empty());

    let before = store.all().to_vec();
    assert!(!store.remove(drop.id));
    assert_eq!(store.all(), before.as_slice());
    assert!(store.get(keep.id).is_some());
}

#[test]
fn collection_survives_serialize_round_trip() {
    let storage = Rc::new(MemoryStorage::new());
    let mut goals: EntityStore<Goal> = EntityStore::with_items(Vec::new(), storage.clone());
    let goal = goals.create(GoalPatch {
        title: Some("Learn Rust".into()),
        progress: Some(40),
        deadline: Some(NaiveDate::from_ymd_opt(2024, 12, 31)),
        ..GoalPatch::default()
    });
    goals.update_with(goal.id, |g| {
        g.add_milestone("Finish the book", None);
    });

    let json = serde_json::to_string(goals.all()).unwrap();
    let back: Vec<Goal> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.as_slice(), goals.all());

    let reloaded: EntityStore<Goal> = EntityStore::load(storage);
    assert_eq!(reloaded.all(), goals.all());
}

#[test]
fn reorder_moves_one_element() {
    let mut store = empty_tasks(Rc::new(MemoryStorage::new()));
    for title in ["A", "B", "C", "D", "E"] {
        store.create(TaskPatch::titled(title));
    }

    assert!(store.reorder(1, 3));
    assert_eq!(titles(&store), ["A", "C", "D", "B", "E"]);

    assert!(!store.reorder(0, 5));
    assert_eq!(titles(&store), ["A", "C", "D", "B", "E"]);
}

#[test]
fn reorder_is_persisted() {
    let storage = Rc::new(MemoryStorage::new());
    let mut store = empty_tasks(storage.clone());
    for title in ["A", "B", "C"] {
        store.create(TaskPatch::titled(title));
    }
    store.reorder(2, 0);

    let reloaded: EntityStore<Task> = EntityStore::load(storage);
    assert_eq!(titles(&reloaded), ["C", "A", "B"]);
}

#[test]
fn streak_counts_consecutive_days_ending_today() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let mut habit = Habit::with_id(1);
    for back in [0, 1, 2, 4, 5] {
        habit.completed_dates.insert(today - Duration::days(back));
    }
    assert_eq!(habit_streak(&habit.completed_dates, today), 3);

    habit.completed_dates.remove(&today);
    assert_eq!(habit_streak(&habit.completed_dates, today), 0);
}

#[test]
fn completion_percentage_edges() {
    assert_eq!(completion_percentage(0, 0), 0);
    assert_eq!(completion_percentage(3, 4), 75);
}
