use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

use crate::links::link_label;
use crate::metrics;
use crate::models::{
    Category, Frequency, GoalSortKey, HabitPatch, NotePatch, ReflectionSortKey, ReminderFilter,
    ReminderSortKey, ResourceSortKey, TaskPatch, TaskSortKey, TaskTag, TimeEntrySortKey,
};
use crate::store::{ByTitle, Entity, EntityId, SortDirection, SortKey, sort_slice};
use crate::utils::{parse_date, parse_tags, today};
use crate::workspace::{Tab, UnknownTab, Workspace};

#[derive(Parser)]
#[command(name = "todo-pro")]
#[command(about = "Tasks, notes, goals, habits and more, kept in one local workspace")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config and data)
    #[arg(long, global = true)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    AddTask {
        /// Task title
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated labels
        #[arg(long)]
        tags: Option<String>,
        /// Status tag: urgent, in-progress, pending
        #[arg(long)]
        tag: Option<String>,
        /// learning, wellness, skill-building, habits, reading, other
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a new note
    AddNote {
        /// Note title
        title: String,
        /// Note content
        #[arg(long)]
        content: Option<String>,
        /// Free-form label
        #[arg(long)]
        tag: Option<String>,
    },
    /// Add a new habit
    AddHabit {
        title: String,
        /// daily, weekly, monthly, custom
        #[arg(long)]
        frequency: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Mark a task as done
    CompleteTask {
        id: EntityId,
        /// Reopen the task instead
        #[arg(long)]
        undo: bool,
    },
    /// Check in a habit for today or a given date
    HabitDone {
        id: EntityId,
        /// Date of the check-in (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Remove the check-in instead
        #[arg(long)]
        undo: bool,
    },
    /// List one collection (the configured default tab if omitted)
    List {
        tab: Option<String>,
        /// Only show items matching this text
        #[arg(long)]
        search: Option<String>,
        /// Field to sort by
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Reminders only: pending (default), completed, dismissed or all
        #[arg(long)]
        status: Option<String>,
        /// Reflections only: show one category
        #[arg(long)]
        category: Option<String>,
    },
    /// Mark a reminder as done
    CompleteReminder { id: EntityId },
    /// Dismiss a reminder without doing it
    DismissReminder { id: EntityId },
    /// Search every collection at once
    Search { term: String },
    /// Show dashboard statistics (default if no subcommand)
    Stats,
    /// Remove an item from a collection
    Remove { tab: String, id: EntityId },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error(transparent)]
    UnknownTab(#[from] UnknownTab),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Changes kept in memory only, could not save: {0}")]
    Unsaved(String),
    #[error("Failed to write output: {0}")]
    OutputError(#[from] std::io::Error),
}

fn parse_due(due: Option<String>) -> Result<Option<NaiveDate>, CliError> {
    due.map(|d| {
        parse_date(&d)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", d, e)))
    })
    .transpose()
}

fn parse_arg<T: FromStr<Err = String>>(value: Option<String>) -> Result<Option<T>, CliError> {
    value
        .map(|v| v.parse().map_err(CliError::InvalidArgument))
        .transpose()
}

// The process exits after each command, so unsaved changes would be lost
fn ensure_saved(ws: &Workspace) -> Result<(), CliError> {
    let unsynced = ws.unsynced_collections();
    if unsynced.is_empty() {
        Ok(())
    } else {
        Err(CliError::Unsaved(unsynced.join(", ")))
    }
}

/// Handle the add-task command
#[allow(clippy::too_many_arguments)]
pub fn handle_add_task(
    title: String,
    due: Option<String>,
    tags: Option<String>,
    tag: Option<String>,
    category: Option<String>,
    description: Option<String>,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let tag: Option<TaskTag> = parse_arg(tag)?;
    let category: Option<Category> = parse_arg(category)?;
    let task = ws.tasks.create(TaskPatch {
        title: Some(title),
        due_date: Some(parse_due(due)?),
        tag,
        category: Some(category),
        description,
        tags: tags.map(|t| parse_tags(&t).into_iter().collect()),
        ..TaskPatch::default()
    });
    ensure_saved(ws)?;
    writeln!(out, "Task created successfully (ID: {})", task.id)?;
    Ok(())
}

/// Handle the add-note command
pub fn handle_add_note(
    title: String,
    content: Option<String>,
    tag: Option<String>,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let note = ws.notes.create(NotePatch {
        title: Some(title),
        content,
        tag,
    });
    ensure_saved(ws)?;
    writeln!(out, "Note created successfully (ID: {})", note.id)?;
    Ok(())
}

pub fn handle_add_habit(
    title: String,
    frequency: Option<String>,
    category: Option<String>,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let habit = ws.habits.create(HabitPatch {
        title: Some(title),
        frequency: parse_arg::<Frequency>(frequency)?,
        category: parse_arg::<Category>(category)?,
        ..HabitPatch::default()
    });
    ensure_saved(ws)?;
    writeln!(out, "Habit created successfully (ID: {})", habit.id)?;
    Ok(())
}

pub fn handle_complete_task(
    id: EntityId,
    undo: bool,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !ws.complete_task(id, !undo, Utc::now()) {
        writeln!(out, "No task with ID {}", id)?;
        return Ok(());
    }
    ensure_saved(ws)?;
    let verb = if undo { "reopened" } else { "completed" };
    writeln!(out, "Task {} {}", id, verb)?;
    Ok(())
}

pub fn handle_habit_done(
    id: EntityId,
    date: Option<String>,
    undo: bool,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let today = today();
    let date = parse_due(date)?.unwrap_or(today);
    let Some(habit) = ws.habits.get(id) else {
        writeln!(out, "No habit with ID {}", id)?;
        return Ok(());
    };
    if habit.is_completed_on(date) != undo {
        let state = if undo { "not checked in" } else { "already checked in" };
        writeln!(out, "Habit {} {} on {}", id, state, date)?;
        return Ok(());
    }
    ws.toggle_habit(id, date, today);
    ensure_saved(ws)?;
    let streak = ws.habits.get(id).map(|h| h.streak).unwrap_or(0);
    writeln!(out, "Habit {} updated for {} (streak: {} days)", id, date, streak)?;
    Ok(())
}

fn ordered<T, K>(
    mut items: Vec<T>,
    sort: Option<&str>,
    direction: SortDirection,
) -> Result<Vec<T>, CliError>
where
    K: SortKey<T> + FromStr<Err = String>,
{
    match sort {
        Some(key) => {
            let key: K = key.parse().map_err(CliError::InvalidArgument)?;
            sort_slice(&mut items, &key, direction);
        }
        None if direction == SortDirection::Desc => items.reverse(),
        None => {}
    }
    Ok(items)
}

fn checkbox(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

fn date_or_dash(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Handle the list command
#[allow(clippy::too_many_arguments)]
pub fn handle_list(
    tab: Tab,
    search: Option<String>,
    sort: Option<String>,
    desc: bool,
    status: Option<String>,
    category: Option<String>,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if status.is_some() && tab != Tab::Reminders {
        return Err(CliError::InvalidArgument(
            "--status only applies to reminders".to_string(),
        ));
    }
    if category.is_some() && tab != Tab::Reflections {
        return Err(CliError::InvalidArgument(
            "--category only applies to reflections".to_string(),
        ));
    }
    ws.set_tab(tab);
    ws.set_search(search.unwrap_or_default());
    let term = ws.search_term().to_string();
    let sort = sort.as_deref();
    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };

    match tab {
        Tab::Tasks => {
            for t in ordered::<_, TaskSortKey>(ws.tasks.search(&term), sort, direction)? {
                writeln!(
                    out,
                    "{} {:>14}  {:<40} due {:<10} {}",
                    checkbox(t.completed),
                    t.id,
                    t.title,
                    date_or_dash(t.due_date),
                    t.tag
                )?;
            }
        }
        Tab::Notes => {
            for n in ordered::<_, ByTitle>(ws.notes.search(&term), sort, direction)? {
                writeln!(out, "{:>14}  {:<40} #{}", n.id, n.title, n.tag)?;
            }
        }
        Tab::Docs => {
            for d in ordered::<_, ByTitle>(ws.docs.search(&term), sort, direction)? {
                writeln!(out, "{:>14}  {:<40} ({})", d.id, d.title, d.category)?;
            }
        }
        Tab::Goals => {
            for g in ordered::<_, GoalSortKey>(ws.goals.search(&term), sort, direction)? {
                writeln!(
                    out,
                    "{:>14}  {:<40} {:>3}%  milestones {}/{}  deadline {}",
                    g.id,
                    g.title,
                    g.progress,
                    g.milestones.iter().filter(|m| m.completed).count(),
                    g.milestones.len(),
                    date_or_dash(g.deadline)
                )?;
            }
        }
        Tab::Habits => {
            let today = today();
            for h in ordered::<_, ByTitle>(ws.habits.search(&term), sort, direction)? {
                let week = h.week_progress(today);
                writeln!(
                    out,
                    "{} {:>14}  {:<40} {:<8} streak {:>3}  week {}/{}",
                    checkbox(h.is_completed_on(today)),
                    h.id,
                    h.title,
                    h.frequency,
                    metrics::habit_streak(&h.completed_dates, today),
                    week.completed,
                    week.total
                )?;
            }
        }
        Tab::Reflections => {
            // Newest first unless asked otherwise
            let (sort, direction) = match sort {
                Some(key) => (Some(key), direction),
                None if desc => (Some("date"), SortDirection::Asc),
                None => (Some("date"), SortDirection::Desc),
            };
            let category: Option<Category> = parse_arg(category)?;
            let reflections = ws.filtered_reflections(category);
            for r in ordered::<_, ReflectionSortKey>(reflections, sort, direction)? {
                let goal = link_label(ws.reflection_goal(&r));
                let habit = link_label(ws.reflection_habit(&r));
                write!(out, "{:>14}  {}  {:<40} ({})", r.id, r.date, r.title, r.category)?;
                if !goal.is_empty() {
                    write!(out, "  goal: {}", goal)?;
                }
                if !habit.is_empty() {
                    write!(out, "  habit: {}", habit)?;
                }
                writeln!(out)?;
            }
        }
        Tab::Resources => {
            let sort = sort.or(Some("library"));
            for r in ordered::<_, ResourceSortKey>(ws.resources.search(&term), sort, direction)? {
                writeln!(
                    out,
                    "{:>14}  {:<40} {:>3}%  {} priority",
                    r.id, r.title, r.progress, r.priority
                )?;
            }
        }
        Tab::Reminders => {
            let today = today();
            let filter: ReminderFilter = parse_arg(status)?.unwrap_or_default();
            for r in ordered::<_, ReminderSortKey>(ws.filtered_reminders(filter), sort, direction)? {
                let task = link_label(ws.reminder_task(&r));
                let overdue = if r.is_overdue(today) { " (overdue)" } else { "" };
                write!(
                    out,
                    "{:>14}  {}  {:<40} [{}]{}",
                    r.id, r.due_date, r.title, r.status, overdue
                )?;
                if !task.is_empty() {
                    write!(out, "  -> {}", task)?;
                }
                writeln!(out)?;
            }
        }
        Tab::Time => {
            let entries = ws.time_entries.filter(|e| {
                term.trim().is_empty()
                    || ws
                        .time_entry_task(e)
                        .is_some_and(|t| t.title.to_lowercase().contains(&term.trim().to_lowercase()))
            });
            for e in ordered::<_, TimeEntrySortKey>(entries, sort, direction)? {
                let task = match link_label(ws.time_entry_task(&e)) {
                    "" => "(removed task)",
                    title => title,
                };
                writeln!(
                    out,
                    "{:>14}  {}  {:>8}  {}",
                    e.id,
                    e.start_time.format("%Y-%m-%d %H:%M"),
                    metrics::format_duration(e.duration),
                    task
                )?;
            }
        }
        Tab::MindMaps => {
            for m in ordered::<_, ByTitle>(ws.mind_maps.search(&term), sort, direction)? {
                writeln!(out, "{:>14}  {:<40} {} nodes", m.id, m.title, m.nodes.len())?;
            }
        }
        Tab::Wellness => {
            for l in ordered::<_, ByTitle>(ws.wellness_logs.search(&term), sort, direction)? {
                writeln!(
                    out,
                    "{:>14}  {}  mood {}  energy {}  stress {}  sleep {:.1}h",
                    l.id,
                    l.date.format("%Y-%m-%d"),
                    l.metrics.mood,
                    l.metrics.energy,
                    l.metrics.stress,
                    l.metrics.sleep
                )?;
            }
        }
        Tab::Dashboard => return handle_stats(ws, out),
    }
    Ok(())
}

pub fn handle_complete_reminder(
    id: EntityId,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !ws.complete_reminder(id) {
        writeln!(out, "No reminder with ID {}", id)?;
        return Ok(());
    }
    ensure_saved(ws)?;
    writeln!(out, "Reminder {} completed", id)?;
    Ok(())
}

pub fn handle_dismiss_reminder(
    id: EntityId,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !ws.dismiss_reminder(id) {
        writeln!(out, "No reminder with ID {}", id)?;
        return Ok(());
    }
    ensure_saved(ws)?;
    writeln!(out, "Reminder {} dismissed", id)?;
    Ok(())
}

/// Handle the search command
pub fn handle_search(term: String, ws: &mut Workspace, out: &mut impl Write) -> Result<(), CliError> {
    ws.set_search(term);
    let hits = ws.search_results();
    if hits.is_empty() {
        writeln!(out, "No matches for '{}'", ws.search_term())?;
        return Ok(());
    }

    fn section<T: Entity>(out: &mut impl Write, name: &str, items: &[T]) -> std::io::Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        writeln!(out, "{} ({})", name, items.len())?;
        for item in items {
            writeln!(out, "  {:>14}  {}", item.id(), item.title())?;
        }
        Ok(())
    }

    section(out, "tasks", &hits.tasks)?;
    section(out, "notes", &hits.notes)?;
    section(out, "docs", &hits.docs)?;
    section(out, "goals", &hits.goals)?;
    section(out, "habits", &hits.habits)?;
    section(out, "reflections", &hits.reflections)?;
    section(out, "resources", &hits.resources)?;
    section(out, "reminders", &hits.reminders)?;
    section(out, "mindmaps", &hits.mind_maps)?;
    Ok(())
}

/// Handle the stats command
pub fn handle_stats(ws: &Workspace, out: &mut impl Write) -> Result<(), CliError> {
    let dash = ws.dashboard(today());
    writeln!(
        out,
        "Tasks: {}/{} done ({}%), {} urgent, {} due today, {} due this week",
        dash.tasks.completed,
        dash.tasks.total,
        dash.tasks.progress,
        dash.tasks.urgent,
        dash.tasks.due_today,
        dash.tasks.due_this_week
    )?;
    writeln!(out, "Activity streak: {} days", dash.activity_streak)?;
    writeln!(out, "Habits checked in this week: {}%", dash.habits_this_week)?;
    writeln!(
        out,
        "Goals: {} active, {}% average progress",
        dash.active_goals, dash.goal_progress
    )?;
    writeln!(out, "Reflections this week: {}", dash.reflections_this_week)?;
    writeln!(
        out,
        "Time tracked: {}",
        metrics::format_duration(dash.tracked_minutes)
    )?;
    writeln!(
        out,
        "Reminders: {} pending, {} overdue",
        dash.pending_reminders, dash.overdue_reminders
    )?;
    writeln!(out, "Notes: {}", dash.total_notes)?;
    if dash.wellness.logs > 0 {
        writeln!(
            out,
            "Wellness (week avg): mood {:.1}, energy {:.1}, stress {:.1}, sleep {:.1}h",
            dash.wellness.mood, dash.wellness.energy, dash.wellness.stress, dash.wellness.sleep
        )?;
    }
    for (category, m) in &dash.categories {
        writeln!(
            out,
            "  {:<15} tasks {}/{} ({}%)  goals {}%  habits on streak {}  time {}",
            category,
            m.completed,
            m.total,
            m.percentage,
            m.goal_progress,
            m.active_habits,
            metrics::format_duration(m.time_spent)
        )?;
    }
    Ok(())
}

/// Handle the remove command
pub fn handle_remove(
    tab: Tab,
    id: EntityId,
    ws: &mut Workspace,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let removed = match tab {
        Tab::Tasks => ws.tasks.remove(id),
        Tab::Notes => ws.notes.remove(id),
        Tab::Docs => ws.docs.remove(id),
        Tab::Goals => ws.goals.remove(id),
        Tab::Habits => ws.habits.remove(id),
        Tab::Reflections => ws.reflections.remove(id),
        Tab::Resources => ws.resources.remove(id),
        Tab::Reminders => ws.reminders.remove(id),
        Tab::Time => ws.time_entries.remove(id),
        Tab::MindMaps => ws.mind_maps.remove(id),
        Tab::Wellness => ws.wellness_logs.remove(id),
        Tab::Dashboard => {
            return Err(CliError::InvalidArgument(
                "the dashboard has nothing to remove".to_string(),
            ));
        }
    };
    if removed {
        ensure_saved(ws)?;
        writeln!(out, "Removed {} from {}", id, tab)?;
    } else {
        writeln!(out, "Nothing to remove: no item {} in {}", id, tab)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::rc::Rc;

    fn workspace() -> Workspace {
        Workspace::load(Rc::new(MemoryStorage::new()))
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["todo-pro", "list", "tasks", "--dev", "--sort", "due"]).unwrap();
        assert!(cli.dev);
        assert!(matches!(
            cli.command,
            Some(Commands::List { ref tab, ref sort, .. }) if tab.as_deref() == Some("tasks") && sort.as_deref() == Some("due")
        ));
    }

    #[test]
    fn add_task_rejects_bad_date() {
        let mut ws = workspace();
        let mut out = Vec::new();
        let err = handle_add_task(
            "Taxes".into(),
            Some("next tuesday".into()),
            None,
            None,
            None,
            None,
            &mut ws,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::DateParseError(_)));
        assert_eq!(ws.tasks.len(), 3);
    }

    #[test]
    fn add_task_parses_fields() {
        let mut ws = workspace();
        let mut out = Vec::new();
        handle_add_task(
            "Read chapter 4".into(),
            Some("2024-09-01".into()),
            Some("books, evening".into()),
            Some("urgent".into()),
            Some("reading".into()),
            None,
            &mut ws,
            &mut out,
        )
        .unwrap();
        let task = ws.tasks.all().last().unwrap();
        assert_eq!(task.tag, TaskTag::Urgent);
        assert_eq!(task.category, Some(Category::Reading));
        assert_eq!(task.tags.len(), 2);
        assert!(output(out).starts_with("Task created successfully"));
    }

    #[test]
    fn list_sorts_by_title_descending() {
        let mut ws = workspace();
        let mut out = Vec::new();
        handle_list(Tab::Tasks, None, Some("title".into()), true, None, None, &mut ws, &mut out).unwrap();
        let text = output(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Update user documentation"));
        assert!(lines[2].contains("Design new landing page"));
    }

    #[test]
    fn list_rejects_unknown_sort_key() {
        let mut ws = workspace();
        let mut out = Vec::new();
        let err = handle_list(Tab::Notes, None, Some("mood".into()), false, None, None, &mut ws, &mut out)
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    fn add_reminder(ws: &mut Workspace, title: &str, task_id: Option<EntityId>) -> EntityId {
        ws.reminders
            .create(crate::models::ReminderPatch {
                title: Some(title.into()),
                task_id: Some(task_id),
                ..crate::models::ReminderPatch::default()
            })
            .id
    }

    #[test]
    fn reminders_list_pending_unless_asked() {
        let mut ws = workspace();
        let mut out = Vec::new();
        let call = add_reminder(&mut ws, "Call the bank", Some(1));
        let gym = add_reminder(&mut ws, "Gym membership", None);
        add_reminder(&mut ws, "Water plants", None);
        handle_complete_reminder(call, &mut ws, &mut out).unwrap();
        handle_dismiss_reminder(gym, &mut ws, &mut out).unwrap();
        handle_dismiss_reminder(404, &mut ws, &mut out).unwrap();
        assert!(output(out).contains("No reminder with ID 404"));

        let mut out = Vec::new();
        handle_list(Tab::Reminders, None, None, false, None, None, &mut ws, &mut out).unwrap();
        let text = output(out);
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Water plants"));

        let mut out = Vec::new();
        handle_list(Tab::Reminders, None, None, false, Some("completed".into()), None, &mut ws, &mut out)
            .unwrap();
        let text = output(out);
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Call the bank"));
        assert!(text.contains("-> Design new landing page"));

        let mut out = Vec::new();
        handle_list(Tab::Reminders, None, None, false, Some("all".into()), None, &mut ws, &mut out)
            .unwrap();
        assert_eq!(output(out).lines().count(), 3);
    }

    #[test]
    fn reflections_list_by_category() {
        let mut ws = workspace();
        let mut out = Vec::new();
        for (title, category) in [("Slept early", Category::Wellness), ("Read a paper", Category::Reading)] {
            ws.reflections.create(crate::models::ReflectionPatch {
                title: Some(title.into()),
                category: Some(category),
                ..crate::models::ReflectionPatch::default()
            });
        }
        handle_list(Tab::Reflections, None, None, false, None, Some("reading".into()), &mut ws, &mut out)
            .unwrap();
        let text = output(out);
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Read a paper"));

        let mut out = Vec::new();
        let err = handle_list(Tab::Tasks, None, None, false, None, Some("reading".into()), &mut ws, &mut out)
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
        let err = handle_list(Tab::Reminders, None, None, false, Some("snoozed".into()), None, &mut ws, &mut out)
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn completing_a_missing_task_is_reported_not_fatal() {
        let mut ws = workspace();
        let mut out = Vec::new();
        handle_complete_task(999, false, &mut ws, &mut out).unwrap();
        assert!(output(out).contains("No task with ID 999"));
    }

    #[test]
    fn habit_done_twice_is_idempotent() {
        let mut ws = workspace();
        let mut out = Vec::new();
        handle_add_habit("Stretch".into(), None, None, &mut ws, &mut out).unwrap();
        let id = ws.habits.all()[0].id;

        handle_habit_done(id, None, false, &mut ws, &mut out).unwrap();
        handle_habit_done(id, None, false, &mut ws, &mut out).unwrap();
        assert_eq!(ws.habits.get(id).unwrap().completed_dates.len(), 1);
        assert_eq!(ws.habits.get(id).unwrap().streak, 1);
        assert!(output(out).contains("already checked in"));
    }

    #[test]
    fn unsaved_changes_are_an_error() {
        let storage = Rc::new(MemoryStorage::new());
        let mut ws = Workspace::load(storage.clone());
        storage.set_fail_writes(true);
        let mut out = Vec::new();
        let err = handle_add_note("Draft".into(), None, None, &mut ws, &mut out).unwrap_err();
        assert!(matches!(err, CliError::Unsaved(ref names) if names == "notes"));
        assert_eq!(ws.notes.len(), 3);
    }

    #[test]
    fn remove_from_dashboard_is_invalid() {
        let mut ws = workspace();
        let mut out = Vec::new();
        assert!(handle_remove(Tab::Dashboard, 1, &mut ws, &mut out).is_err());
        handle_remove(Tab::Tasks, 1, &mut ws, &mut out).unwrap();
        assert_eq!(ws.tasks.len(), 2);
        handle_remove(Tab::Tasks, 1, &mut ws, &mut out).unwrap();
        assert!(output(out).contains("Nothing to remove"));
    }
}
