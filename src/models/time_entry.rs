use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::store::{Entity, EntityId, SortKey};

/// A tracked interval of work on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: EntityId,
    /// Weak reference; the task may since have been removed
    pub task_id: EntityId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Whole minutes between start and end, 0 while open
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Default)]
pub struct TimeEntryPatch {
    pub task_id: Option<EntityId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<Option<DateTime<Utc>>>,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    fn refresh_duration(&mut self) {
        self.duration = match self.end_time {
            Some(end) => (end - self.start_time).num_minutes().max(0),
            None => 0,
        };
    }
}

impl Entity for TimeEntry {
    const COLLECTION: &'static str = "time-entries";
    type Patch = TimeEntryPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        ""
    }

    fn with_id(id: EntityId) -> Self {
        TimeEntry {
            id,
            task_id: 0,
            start_time: Utc::now(),
            end_time: None,
            duration: 0,
        }
    }

    fn apply(&mut self, patch: TimeEntryPatch) {
        if let Some(task_id) = patch.task_id {
            self.task_id = task_id;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        self.refresh_duration();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEntrySortKey {
    StartTime,
    Duration,
}

impl SortKey<TimeEntry> for TimeEntrySortKey {
    fn compare(&self, a: &TimeEntry, b: &TimeEntry) -> Ordering {
        match self {
            TimeEntrySortKey::StartTime => a.start_time.cmp(&b.start_time),
            TimeEntrySortKey::Duration => a.duration.cmp(&b.duration),
        }
    }
}

impl FromStr for TimeEntrySortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "start-time" => Ok(TimeEntrySortKey::StartTime),
            "duration" => Ok(TimeEntrySortKey::Duration),
            other => Err(format!("Unknown time entry sort key: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn duration_is_derived_in_whole_minutes() {
        let start = Utc::now();
        let mut entry = TimeEntry::with_id(1);
        entry.apply(TimeEntryPatch {
            task_id: Some(3),
            start_time: Some(start),
            end_time: Some(Some(start + Duration::seconds(25 * 60 + 59))),
        });
        assert_eq!(entry.duration, 25);
        assert!(!entry.is_open());
    }

    #[test]
    fn end_before_start_counts_as_zero() {
        let start = Utc::now();
        let mut entry = TimeEntry::with_id(1);
        entry.apply(TimeEntryPatch {
            start_time: Some(start),
            end_time: Some(Some(start - Duration::minutes(5))),
            ..TimeEntryPatch::default()
        });
        assert_eq!(entry.duration, 0);
    }

    #[test]
    fn reopening_clears_duration() {
        let start = Utc::now();
        let mut entry = TimeEntry::with_id(1);
        entry.apply(TimeEntryPatch {
            start_time: Some(start),
            end_time: Some(Some(start + Duration::minutes(10))),
            ..TimeEntryPatch::default()
        });
        entry.apply(TimeEntryPatch {
            end_time: Some(None),
            ..TimeEntryPatch::default()
        });
        assert_eq!(entry.duration, 0);
        assert!(entry.is_open());
    }
}
