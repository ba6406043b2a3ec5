//! Derived statistics, recomputed on every read.
//!
//! Everything here is a pure function of its inputs. "Today" is always
//! passed in so results are reproducible.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeSet, HashMap};

use crate::models::{
    Category, Frequency, Goal, Habit, Reflection, Task, TaskTag, TimeEntry, WellnessLog,
};
use crate::store::EntityId;

/// How far back a streak walk looks
pub const MAX_STREAK_DAYS: u32 = 365;

/// `round(completed / total * 100)`, 0 for an empty set
pub fn completion_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (completed as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Consecutive days ending today present in `days`, scanning at most
/// [`MAX_STREAK_DAYS`] back. 0 if today itself is missing.
pub fn habit_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    if !days.contains(&today) {
        return 0;
    }
    let mut streak = 0;
    for offset in 0..MAX_STREAK_DAYS {
        let day = today - Duration::days(i64::from(offset));
        if !days.contains(&day) {
            break;
        }
        streak += 1;
    }
    streak
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Sunday-to-Saturday week holding `today`
pub fn week_window(today: NaiveDate) -> DateWindow {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    DateWindow {
        start,
        end: start + Duration::days(6),
    }
}

/// Calendar month holding `today`
pub fn month_window(today: NaiveDate) -> DateWindow {
    let start = today.with_day(1).unwrap_or(today);
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    };
    let end = next_month
        .and_then(|d| d.pred_opt())
        .unwrap_or(today);
    DateWindow { start, end }
}

/// Percentage of `items` with at least one date inside `window`
pub fn progress_in_window<T, I>(items: &[T], window: DateWindow, dates_of: impl Fn(&T) -> I) -> u8
where
    I: IntoIterator<Item = NaiveDate>,
{
    let hits = items
        .iter()
        .filter(|item| dates_of(item).into_iter().any(|d| window.contains(d)))
        .count();
    completion_percentage(hits, items.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// Completions this week measured against the habit's frequency.
///
/// Daily habits aim for 7, weekly habits for 1. Other frequencies have no
/// weekly target and always report 0%.
pub fn habit_week_progress(habit: &Habit, today: NaiveDate) -> WeekProgress {
    let window = week_window(today);
    let completed = habit
        .completed_dates
        .iter()
        .filter(|d| window.contains(**d))
        .count();
    let (total, percentage) = match habit.frequency {
        Frequency::Daily => (7, completion_percentage(completed, 7)),
        Frequency::Weekly => (1, if completed > 0 { 100 } else { 0 }),
        Frequency::Monthly | Frequency::Custom => (0, 0),
    };
    WeekProgress {
        completed,
        total,
        percentage,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub urgent: usize,
    pub progress: u8,
    pub due_today: usize,
    pub due_this_week: usize,
}

pub fn task_stats(tasks: &[Task], today: NaiveDate) -> TaskStats {
    let week = week_window(today);
    let completed = tasks.iter().filter(|t| t.completed).count();
    TaskStats {
        total: tasks.len(),
        completed,
        urgent: tasks.iter().filter(|t| t.tag == TaskTag::Urgent).count(),
        progress: completion_percentage(completed, tasks.len()),
        due_today: tasks
            .iter()
            .filter(|t| !t.completed && t.due_date == Some(today))
            .count(),
        due_this_week: tasks
            .iter()
            .filter(|t| t.due_date.is_some_and(|d| week.contains(d)))
            .count(),
    }
}

/// Streak of days with any completed task or habit check-in
pub fn activity_streak(tasks: &[Task], habits: &[Habit], today: NaiveDate) -> u32 {
    let mut days: BTreeSet<NaiveDate> = habits
        .iter()
        .flat_map(|h| h.completed_dates.iter().copied())
        .collect();
    days.extend(
        tasks
            .iter()
            .filter(|t| t.completed)
            .filter_map(|t| t.completed_at.map(|at| at.date_naive())),
    );
    habit_streak(&days, today)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryMetrics {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    /// Mean goal progress in the category
    pub goal_progress: u8,
    /// Habits currently on a streak
    pub active_habits: usize,
    /// Minutes tracked against tasks in the category
    pub time_spent: i64,
}

pub fn category_metrics(
    category: Category,
    tasks: &[Task],
    goals: &[Goal],
    habits: &[Habit],
    time_entries: &[TimeEntry],
) -> CategoryMetrics {
    let category_tasks: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.category == Some(category))
        .collect();
    let completed = category_tasks.iter().filter(|t| t.completed).count();
    let total = category_tasks.len();

    let goal_progress: Vec<u32> = goals
        .iter()
        .filter(|g| g.category == Some(category))
        .map(|g| u32::from(g.progress))
        .collect();
    let goal_progress = if goal_progress.is_empty() {
        0
    } else {
        let mean = f64::from(goal_progress.iter().sum::<u32>()) / goal_progress.len() as f64;
        mean.round() as u8
    };

    let active_habits = habits
        .iter()
        .filter(|h| h.category == category && h.streak > 0)
        .count();

    let task_ids: BTreeSet<EntityId> = category_tasks.iter().map(|t| t.id).collect();
    let time_spent = time_entries
        .iter()
        .filter(|e| task_ids.contains(&e.task_id))
        .map(|e| e.duration)
        .sum();

    CategoryMetrics {
        completed,
        total,
        percentage: completion_percentage(completed, total),
        goal_progress,
        active_habits,
        time_spent,
    }
}

/// Minutes tracked per task id, counting closed entries only
pub fn time_per_task(time_entries: &[TimeEntry]) -> HashMap<EntityId, i64> {
    let mut totals = HashMap::new();
    for entry in time_entries.iter().filter(|e| !e.is_open()) {
        *totals.entry(entry.task_id).or_insert(0) += entry.duration;
    }
    totals
}

/// Minutes across all closed entries
pub fn total_tracked_minutes(time_entries: &[TimeEntry]) -> i64 {
    time_entries
        .iter()
        .filter(|e| !e.is_open())
        .map(|e| e.duration)
        .sum()
}

/// `"2h 05m"` style rendering of a minute count
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Reflections dated from the start of this week up to today
pub fn reflections_this_week(reflections: &[Reflection], today: NaiveDate) -> usize {
    let start = week_window(today).start;
    reflections
        .iter()
        .filter(|r| start <= r.date && r.date <= today)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WellnessAverages {
    pub logs: usize,
    pub mood: f64,
    pub energy: f64,
    pub stress: f64,
    pub sleep: f64,
    pub meditation: f64,
    pub exercise: f64,
    pub water_intake: f64,
    pub nutrition: f64,
}

/// Averages over this week's wellness logs; all zero when there are none
pub fn wellness_weekly_averages(logs: &[WellnessLog], today: NaiveDate) -> WellnessAverages {
    let week = week_window(today);
    let week_logs: Vec<&WellnessLog> = logs
        .iter()
        .filter(|l| week.contains(l.date.date_naive()))
        .collect();
    let divisor = week_logs.len().max(1) as f64;
    let mean = |f: &dyn Fn(&WellnessLog) -> f64| week_logs.iter().map(|&l| f(l)).sum::<f64>() / divisor;

    WellnessAverages {
        logs: week_logs.len(),
        mood: mean(&|l| f64::from(l.metrics.mood)),
        energy: mean(&|l| f64::from(l.metrics.energy)),
        stress: mean(&|l| f64::from(l.metrics.stress)),
        sleep: mean(&|l| l.metrics.sleep),
        meditation: mean(&|l| f64::from(l.activities.meditation)),
        exercise: mean(&|l| f64::from(l.activities.exercise)),
        water_intake: mean(&|l| f64::from(l.activities.water_intake)),
        nutrition: mean(&|l| f64::from(l.activities.nutrition)),
    }
}
