//! All collections of one user, wired to a single storage backend.
//!
//! The workspace holds the active tab and the one free-text search term
//! applied across every collection, plus the cross-collection operations
//! (completing tasks, habit check-ins, time tracking, the dashboard).

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::links;
use crate::metrics::{self, CategoryMetrics, TaskStats, WellnessAverages};
use crate::models::{
    Category, Doc, Goal, Habit, MindMap, Note, Reflection, Reminder, ReminderFilter,
    ReminderPatch, ReminderStatus, Resource, Task, TaskPatch, TimeEntry, WellnessLog,
};
use crate::storage::SlotStorage;
use crate::store::{EntityId, EntityStore};
use crate::tracking::TrackingSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Tasks,
    Notes,
    Docs,
    Goals,
    Habits,
    Reflections,
    Resources,
    Reminders,
    Time,
    MindMaps,
    Wellness,
    Dashboard,
}

impl Tab {
    pub const ALL: [Tab; 12] = [
        Tab::Tasks,
        Tab::Notes,
        Tab::Docs,
        Tab::Goals,
        Tab::Habits,
        Tab::Reflections,
        Tab::Resources,
        Tab::Reminders,
        Tab::Time,
        Tab::MindMaps,
        Tab::Wellness,
        Tab::Dashboard,
    ];

    /// Stable selection key
    pub fn key(&self) -> &'static str {
        match self {
            Tab::Tasks => "tasks",
            Tab::Notes => "notes",
            Tab::Docs => "docs",
            Tab::Goals => "goals",
            Tab::Habits => "habits",
            Tab::Reflections => "reflections",
            Tab::Resources => "resources",
            Tab::Reminders => "reminders",
            Tab::Time => "time",
            Tab::MindMaps => "mindmaps",
            Tab::Wellness => "wellness",
            Tab::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tab: {0}")]
pub struct UnknownTab(pub String);

impl FromStr for Tab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Tab::ALL
            .into_iter()
            .find(|tab| tab.key() == key)
            .ok_or_else(|| UnknownTab(s.to_string()))
    }
}

/// Hits for one search term, per collection
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub docs: Vec<Doc>,
    pub goals: Vec<Goal>,
    pub habits: Vec<Habit>,
    pub reflections: Vec<Reflection>,
    pub resources: Vec<Resource>,
    pub reminders: Vec<Reminder>,
    pub mind_maps: Vec<MindMap>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.tasks.len()
            + self.notes.len()
            + self.docs.len()
            + self.goals.len()
            + self.habits.len()
            + self.reflections.len()
            + self.resources.len()
            + self.reminders.len()
            + self.mind_maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Everything shown on the dashboard tab
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub tasks: TaskStats,
    pub activity_streak: u32,
    /// Share of habits checked in at least once this week
    pub habits_this_week: u8,
    /// Mean progress over all goals
    pub goal_progress: u8,
    pub active_goals: usize,
    pub reflections_this_week: usize,
    pub tracked_minutes: i64,
    pub pending_reminders: usize,
    pub overdue_reminders: usize,
    pub wellness: WellnessAverages,
    pub categories: Vec<(Category, CategoryMetrics)>,
    pub total_notes: usize,
}

pub struct Workspace {
    pub tasks: EntityStore<Task>,
    pub notes: EntityStore<Note>,
    pub docs: EntityStore<Doc>,
    pub goals: EntityStore<Goal>,
    pub habits: EntityStore<Habit>,
    pub reflections: EntityStore<Reflection>,
    pub resources: EntityStore<Resource>,
    pub reminders: EntityStore<Reminder>,
    pub time_entries: EntityStore<TimeEntry>,
    pub mind_maps: EntityStore<MindMap>,
    pub wellness_logs: EntityStore<WellnessLog>,
    current_tab: Tab,
    search: String,
    tracking: Option<TrackingSession>,
}

impl Workspace {
    /// Load every collection from `storage`
    pub fn load(storage: Rc<dyn SlotStorage>) -> Self {
        let workspace = Self {
            tasks: EntityStore::load(storage.clone()),
            notes: EntityStore::load(storage.clone()),
            docs: EntityStore::load(storage.clone()),
            goals: EntityStore::load(storage.clone()),
            habits: EntityStore::load(storage.clone()),
            reflections: EntityStore::load(storage.clone()),
            resources: EntityStore::load(storage.clone()),
            reminders: EntityStore::load(storage.clone()),
            time_entries: EntityStore::load(storage.clone()),
            mind_maps: EntityStore::load(storage.clone()),
            wellness_logs: EntityStore::load(storage),
            current_tab: Tab::default(),
            search: String::new(),
            tracking: None,
        };
        info!(
            tasks = workspace.tasks.len(),
            notes = workspace.notes.len(),
            goals = workspace.goals.len(),
            habits = workspace.habits.len(),
            "workspace loaded"
        );
        workspace
    }

    pub fn current_tab(&self) -> Tab {
        self.current_tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
    }

    /// Switch tabs by key. Unknown keys leave the current tab in place.
    pub fn select_tab(&mut self, key: &str) -> Result<Tab, UnknownTab> {
        let tab: Tab = key.parse()?;
        self.current_tab = tab;
        debug!(tab = %tab, "tab selected");
        Ok(tab)
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Apply the current search term to every collection at once.
    /// A blank term matches everything.
    pub fn search_results(&self) -> SearchResults {
        let term = self.search.as_str();
        SearchResults {
            tasks: self.tasks.search(term),
            notes: self.notes.search(term),
            docs: self.docs.search(term),
            goals: self.goals.search(term),
            habits: self.habits.search(term),
            reflections: self.reflections.search(term),
            resources: self.resources.search(term),
            reminders: self.reminders.search(term),
            mind_maps: self.mind_maps.search(term),
        }
    }

    /// Collections whose last write did not reach storage
    pub fn unsynced_collections(&self) -> Vec<&'static str> {
        use crate::store::Entity;
        let mut out = Vec::new();
        let mut check = |synced: bool, name: &'static str| {
            if !synced {
                out.push(name);
            }
        };
        check(self.tasks.is_synced(), Task::COLLECTION);
        check(self.notes.is_synced(), Note::COLLECTION);
        check(self.docs.is_synced(), Doc::COLLECTION);
        check(self.goals.is_synced(), Goal::COLLECTION);
        check(self.habits.is_synced(), Habit::COLLECTION);
        check(self.reflections.is_synced(), Reflection::COLLECTION);
        check(self.resources.is_synced(), Resource::COLLECTION);
        check(self.reminders.is_synced(), Reminder::COLLECTION);
        check(self.time_entries.is_synced(), TimeEntry::COLLECTION);
        check(self.mind_maps.is_synced(), MindMap::COLLECTION);
        check(self.wellness_logs.is_synced(), WellnessLog::COLLECTION);
        out
    }

    /// Mark a task done or reopen it
    pub fn complete_task(&mut self, id: EntityId, done: bool, now: DateTime<Utc>) -> bool {
        self.tasks.update(id, TaskPatch::completion(done, now))
    }

    /// Flip a habit check-in for `date`. `None` when the habit does not
    /// exist, otherwise whether the date is now checked.
    pub fn toggle_habit(&mut self, id: EntityId, date: NaiveDate, today: NaiveDate) -> Option<bool> {
        let mut checked = None;
        self.habits.update_with(id, |habit| {
            checked = Some(habit.toggle_completion(date, today));
        });
        checked
    }

    /// Recompute stored streaks against `today`, persisting only when one
    /// actually changed.
    pub fn refresh_streaks(&mut self, today: NaiveDate) {
        let stale: Vec<EntityId> = self
            .habits
            .all()
            .iter()
            .filter(|h| h.streak != metrics::habit_streak(&h.completed_dates, today))
            .map(|h| h.id)
            .collect();
        for id in stale {
            self.habits.update_with(id, |habit| habit.refresh_streak(today));
        }
    }

    pub fn complete_reminder(&mut self, id: EntityId) -> bool {
        self.reminders
            .update(id, ReminderPatch::status(ReminderStatus::Completed))
    }

    pub fn dismiss_reminder(&mut self, id: EntityId) -> bool {
        self.reminders
            .update(id, ReminderPatch::status(ReminderStatus::Dismissed))
    }

    /// Reminders passing `filter` and matching the search term
    pub fn filtered_reminders(&self, filter: ReminderFilter) -> Vec<Reminder> {
        let mut hits = self.reminders.search(&self.search);
        hits.retain(|r| filter.matches(r));
        hits
    }

    /// Reflections in `category` (all when `None`) matching the search term
    pub fn filtered_reflections(&self, category: Option<Category>) -> Vec<Reflection> {
        let mut hits = self.reflections.search(&self.search);
        hits.retain(|r| category.is_none_or(|c| r.category == c));
        hits
    }

    pub fn add_milestone(
        &mut self,
        goal_id: EntityId,
        title: impl Into<String>,
        due_date: Option<NaiveDate>,
    ) -> Option<EntityId> {
        let mut added = None;
        let title = title.into();
        self.goals.update_with(goal_id, |goal| {
            added = Some(goal.add_milestone(title, due_date));
        });
        added
    }

    pub fn tracking(&self) -> Option<&TrackingSession> {
        self.tracking.as_ref()
    }

    /// Begin timing `task_id`. A session already running is stopped and
    /// recorded first. `false` when the task does not exist.
    pub fn start_tracking(&mut self, task_id: EntityId, now: DateTime<Utc>) -> bool {
        if self.tasks.get(task_id).is_none() {
            return false;
        }
        self.stop_tracking(now);
        self.tracking = Some(TrackingSession::start(task_id, now));
        true
    }

    /// Close the running session and store it as a time entry
    pub fn stop_tracking(&mut self, now: DateTime<Utc>) -> Option<TimeEntry> {
        let session = self.tracking.take()?;
        Some(self.time_entries.create(session.stop(now)))
    }

    pub fn reminder_task(&self, reminder: &Reminder) -> Option<&Task> {
        links::reminder_task(reminder, &self.tasks)
    }

    pub fn reflection_goal(&self, reflection: &Reflection) -> Option<&Goal> {
        links::reflection_goal(reflection, &self.goals)
    }

    pub fn reflection_habit(&self, reflection: &Reflection) -> Option<&Habit> {
        links::reflection_habit(reflection, &self.habits)
    }

    pub fn time_entry_task(&self, entry: &TimeEntry) -> Option<&Task> {
        links::time_entry_task(entry, &self.tasks)
    }

    pub fn dashboard(&self, today: NaiveDate) -> Dashboard {
        let tasks = self.tasks.all();
        let goals = self.goals.all();
        let habits = self.habits.all();
        let entries = self.time_entries.all();
        let reminders = self.reminders.all();

        let goal_progress = if goals.is_empty() {
            0
        } else {
            let sum: u32 = goals.iter().map(|g| u32::from(g.progress)).sum();
            (f64::from(sum) / goals.len() as f64).round() as u8
        };

        Dashboard {
            tasks: metrics::task_stats(tasks, today),
            activity_streak: metrics::activity_streak(tasks, habits, today),
            habits_this_week: metrics::progress_in_window(
                habits,
                metrics::week_window(today),
                |h| h.completed_dates.clone(),
            ),
            goal_progress,
            active_goals: goals
                .iter()
                .filter(|g| g.status != crate::models::GoalStatus::Completed)
                .count(),
            reflections_this_week: metrics::reflections_this_week(self.reflections.all(), today),
            tracked_minutes: metrics::total_tracked_minutes(entries),
            pending_reminders: reminders
                .iter()
                .filter(|r| r.status == ReminderStatus::Pending)
                .count(),
            overdue_reminders: reminders.iter().filter(|r| r.is_overdue(today)).count(),
            wellness: metrics::wellness_weekly_averages(self.wellness_logs.all(), today),
            categories: [Category::Learning, Category::Wellness, Category::SkillBuilding]
                .into_iter()
                .map(|c| (c, metrics::category_metrics(c, tasks, goals, habits, entries)))
                .collect(),
            total_notes: self.notes.len(),
        }
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("current_tab", &self.current_tab)
            .field("search", &self.search)
            .field("tasks", &self.tasks)
            .field("habits", &self.habits)
            .field("tracking", &self.tracking)
            .finish_non_exhaustive()
    }
}
