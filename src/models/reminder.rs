use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::Priority;
use crate::store::{Entity, EntityId, Searchable, SortKey, cmp_present_first, contains_term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Completed,
    Dismissed,
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderStatus::Pending => write!(f, "pending"),
            ReminderStatus::Completed => write!(f, "completed"),
            ReminderStatus::Dismissed => write!(f, "dismissed"),
        }
    }
}

impl FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReminderStatus::Pending),
            "completed" => Ok(ReminderStatus::Completed),
            "dismissed" => Ok(ReminderStatus::Dismissed),
            other => Err(format!("Unknown reminder status: {}", other)),
        }
    }
}

/// Which reminders a listing shows. Pending ones unless asked otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderFilter {
    Status(ReminderStatus),
    All,
}

impl Default for ReminderFilter {
    fn default() -> Self {
        ReminderFilter::Status(ReminderStatus::Pending)
    }
}

impl ReminderFilter {
    pub fn matches(&self, reminder: &Reminder) -> bool {
        match self {
            ReminderFilter::Status(status) => reminder.status == *status,
            ReminderFilter::All => true,
        }
    }
}

impl FromStr for ReminderFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(ReminderFilter::All);
        }
        s.parse().map(ReminderFilter::Status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub status: ReminderStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub repeat: Repeat,
    /// Weak reference to a task; may point at nothing
    #[serde(default)]
    pub task_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<Option<NaiveTime>>,
    pub status: Option<ReminderStatus>,
    pub priority: Option<Priority>,
    pub repeat: Option<Repeat>,
    pub task_id: Option<Option<EntityId>>,
}

impl ReminderPatch {
    pub fn status(status: ReminderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Reminder {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == ReminderStatus::Pending && self.due_date < today
    }
}

impl Entity for Reminder {
    const COLLECTION: &'static str = "reminders";
    type Patch = ReminderPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Reminder {
            id,
            title: String::new(),
            description: String::new(),
            due_date: crate::utils::today(),
            due_time: None,
            status: ReminderStatus::Pending,
            priority: Priority::Medium,
            repeat: Repeat::None,
            task_id: None,
        }
    }

    fn apply(&mut self, patch: ReminderPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(due_time) = patch.due_time {
            self.due_time = due_time;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(repeat) = patch.repeat {
            self.repeat = repeat;
        }
        if let Some(task_id) = patch.task_id {
            self.task_id = task_id;
        }
    }
}

impl Searchable for Reminder {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSortKey {
    /// Due date, then time of day with untimed reminders last
    Due,
    Priority,
}

impl SortKey<Reminder> for ReminderSortKey {
    fn compare(&self, a: &Reminder, b: &Reminder) -> Ordering {
        match self {
            ReminderSortKey::Due => a
                .due_date
                .cmp(&b.due_date)
                .then_with(|| cmp_present_first(&a.due_time, &b.due_time)),
            ReminderSortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
        }
    }
}

impl FromStr for ReminderSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "due" | "due-date" => Ok(ReminderSortKey::Due),
            "priority" => Ok(ReminderSortKey::Priority),
            other => Err(format!("Unknown reminder sort key: {}", other)),
        }
    }
}
