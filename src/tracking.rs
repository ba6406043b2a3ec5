use chrono::{DateTime, Utc};

use crate::models::TimeEntryPatch;
use crate::store::EntityId;

/// A running timer against one task.
///
/// The session is transient. Nothing is persisted until [`stop`] hands
/// back a closed time entry for the caller to store.
///
/// [`stop`]: TrackingSession::stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSession {
    task_id: EntityId,
    started_at: DateTime<Utc>,
}

impl TrackingSession {
    pub fn start(task_id: EntityId, now: DateTime<Utc>) -> Self {
        tracing::debug!(task_id, "tracking started");
        Self {
            task_id,
            started_at: now,
        }
    }

    pub fn task_id(&self) -> EntityId {
        self.task_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds since start, never negative
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }

    /// Elapsed time as `HH:MM:SS`
    pub fn elapsed(&self, now: DateTime<Utc>) -> String {
        let secs = self.elapsed_seconds(now);
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    /// End the session, producing the fields of a closed time entry
    pub fn stop(self, now: DateTime<Utc>) -> TimeEntryPatch {
        tracing::debug!(task_id = self.task_id, seconds = self.elapsed_seconds(now), "tracking stopped");
        TimeEntryPatch {
            task_id: Some(self.task_id),
            start_time: Some(self.started_at),
            end_time: Some(Some(now)),
        }
    }
}
