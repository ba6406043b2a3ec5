use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::Category;
use crate::store::{
    Entity, EntityId, Searchable, Sequenced, SortKey, cmp_present_first, cmp_text, contains_term,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskTag {
    Urgent,
    InProgress,
    Completed,
    #[default]
    Pending,
}

impl TaskTag {
    /// Status ordering used when sorting: urgent work first, done work last
    pub fn rank(&self) -> u8 {
        match self {
            TaskTag::Urgent => 0,
            TaskTag::InProgress => 1,
            TaskTag::Pending => 2,
            TaskTag::Completed => 3,
        }
    }
}

impl fmt::Display for TaskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskTag::Urgent => write!(f, "urgent"),
            TaskTag::InProgress => write!(f, "in-progress"),
            TaskTag::Completed => write!(f, "completed"),
            TaskTag::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for TaskTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(TaskTag::Urgent),
            "in-progress" => Ok(TaskTag::InProgress),
            "completed" => Ok(TaskTag::Completed),
            "pending" => Ok(TaskTag::Pending),
            other => Err(format!("Unknown task tag: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tag: TaskTag,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub tag: Option<TaskTag>,
    pub category: Option<Option<Category>>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Mark done (stamping `completed_at`) or reopen a task
    pub fn completion(done: bool, now: DateTime<Utc>) -> Self {
        Self {
            completed: Some(done),
            completed_at: Some(done.then_some(now)),
            tag: Some(if done { TaskTag::Completed } else { TaskTag::Pending }),
            ..Self::default()
        }
    }
}

impl Entity for Task {
    const COLLECTION: &'static str = "tasks";
    type Patch = TaskPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Task {
            id,
            title: String::new(),
            completed: false,
            due_date: None,
            tag: TaskTag::Pending,
            category: None,
            description: String::new(),
            tags: BTreeSet::new(),
            completed_at: None,
        }
    }

    fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(tag) = patch.tag {
            self.tag = tag;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
    }

    fn seed() -> Vec<Self> {
        let sample = |id, title: &str, completed, due: (i32, u32, u32), tag, description: &str| Task {
            id,
            title: title.to_string(),
            completed,
            due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2),
            tag,
            category: None,
            description: description.to_string(),
            tags: BTreeSet::new(),
            completed_at: None,
        };
        vec![
            sample(
                1,
                "Design new landing page",
                false,
                (2024, 2, 15),
                TaskTag::InProgress,
                "Create a modern and engaging landing page design",
            ),
            sample(
                2,
                "Update user documentation",
                true,
                (2024, 2, 10),
                TaskTag::Completed,
                "Review and update all user-facing documentation",
            ),
            sample(
                3,
                "Fix authentication bugs",
                false,
                (2024, 2, 20),
                TaskTag::Urgent,
                "Address reported authentication issues",
            ),
        ]
    }
}

impl Sequenced for Task {}

impl Searchable for Task {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    DueDate,
    Title,
    Status,
}

impl SortKey<Task> for TaskSortKey {
    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            TaskSortKey::DueDate => cmp_present_first(&a.due_date, &b.due_date),
            TaskSortKey::Title => cmp_text(&a.title, &b.title),
            TaskSortKey::Status => a.tag.rank().cmp(&b.tag.rank()),
        }
    }
}

impl FromStr for TaskSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "due" | "due-date" | "duedate" => Ok(TaskSortKey::DueDate),
            "title" => Ok(TaskSortKey::Title),
            "status" | "tag" => Ok(TaskSortKey::Status),
            other => Err(format!("Unknown task sort key: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EntityStore, SortDirection};
    use crate::storage::MemoryStorage;
    use std::rc::Rc;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, d)
    }

    fn store() -> EntityStore<Task> {
        EntityStore::with_items(Vec::new(), Rc::new(MemoryStorage::new()))
    }

    #[test]
    fn seed_matches_sample_tasks() {
        let seed = Task::seed();
        assert_eq!(seed.len(), 3);
        assert_eq!(seed[2].tag, TaskTag::Urgent);
        assert!(seed[1].completed);
    }

    #[test]
    fn completion_patch_stamps_and_clears_timestamp() {
        let now = Utc::now();
        let mut task = Task::with_id(1);
        task.apply(TaskPatch::completion(true, now));
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));
        assert_eq!(task.tag, TaskTag::Completed);

        task.apply(TaskPatch::completion(false, now));
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.tag, TaskTag::Pending);
    }

    #[test]
    fn due_date_sort_puts_undated_last() {
        let mut store = store();
        for (title, due) in [("b", day(9)), ("none", None), ("a", day(2))] {
            store.create(TaskPatch {
                title: Some(title.into()),
                due_date: Some(due),
                ..TaskPatch::default()
            });
        }
        let sorted = store.sort_by(&TaskSortKey::DueDate, SortDirection::Asc);
        let titles: Vec<&str> = sorted.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "none"]);
    }

    #[test]
    fn status_sort_uses_priority_table() {
        let mut store = store();
        for tag in [TaskTag::Completed, TaskTag::Pending, TaskTag::Urgent, TaskTag::InProgress] {
            store.create(TaskPatch {
                tag: Some(tag),
                ..TaskPatch::default()
            });
        }
        let tags: Vec<TaskTag> = store
            .sort_by(&TaskSortKey::Status, SortDirection::Asc)
            .iter()
            .map(|t| t.tag)
            .collect();
        assert_eq!(
            tags,
            vec![TaskTag::Urgent, TaskTag::InProgress, TaskTag::Pending, TaskTag::Completed]
        );
    }

    #[test]
    fn title_sort_ignores_case() {
        let mut store = store();
        for title in ["banana", "Apple", "cherry"] {
            store.create(TaskPatch::titled(title));
        }
        let sorted = store.sort_by(&TaskSortKey::Title, SortDirection::Desc);
        let titles: Vec<&str> = sorted.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn search_matches_title_only() {
        let mut store = store();
        store.create(TaskPatch {
            title: Some("Write report".into()),
            description: Some("quarterly numbers".into()),
            ..TaskPatch::default()
        });
        assert_eq!(store.search("REPORT").len(), 1);
        assert!(store.search("quarterly").is_empty());
        assert_eq!(store.search("   ").len(), 1);
    }

    #[test]
    fn reads_json_with_missing_optional_fields() {
        let task: Task = serde_json::from_str(
            r#"{"id":1,"title":"Old","completed":false,"dueDate":"2024-02-15","tag":"in-progress","description":""}"#,
        )
        .unwrap();
        assert_eq!(task.tag, TaskTag::InProgress);
        assert!(task.tags.is_empty());
        assert_eq!(task.category, None);
    }
}
