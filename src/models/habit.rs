use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::Category;
use crate::metrics::{self, WeekProgress};
use crate::store::{Entity, EntityId, Searchable, contains_term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "custom" => Ok(Frequency::Custom),
            other => Err(format!("Unknown frequency: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    #[default]
    Anytime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitReminder {
    pub enabled: bool,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    /// Last computed streak, refreshed whenever completions change
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
    #[serde(default = "default_habit_category")]
    pub category: Category,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub reminder: HabitReminder,
}

fn default_habit_category() -> Category {
    Category::Habits
}

#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub time_of_day: Option<TimeOfDay>,
    pub streak: Option<u32>,
    pub completed_dates: Option<BTreeSet<NaiveDate>>,
    pub category: Option<Category>,
    pub reminder: Option<HabitReminder>,
}

impl Habit {
    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    /// Flip the completion for `date` and refresh the streak as of `today`.
    /// Returns whether the date is now marked complete.
    pub fn toggle_completion(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        let now_complete = if self.completed_dates.remove(&date) {
            false
        } else {
            self.completed_dates.insert(date);
            true
        };
        self.refresh_streak(today);
        now_complete
    }

    pub fn refresh_streak(&mut self, today: NaiveDate) {
        self.streak = metrics::habit_streak(&self.completed_dates, today);
    }

    pub fn week_progress(&self, today: NaiveDate) -> WeekProgress {
        metrics::habit_week_progress(self, today)
    }
}

impl Entity for Habit {
    const COLLECTION: &'static str = "habits";
    type Patch = HabitPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Habit {
            id,
            title: String::new(),
            description: String::new(),
            frequency: Frequency::Daily,
            time_of_day: TimeOfDay::Anytime,
            streak: 0,
            completed_dates: BTreeSet::new(),
            category: default_habit_category(),
            created: Utc::now(),
            reminder: HabitReminder::default(),
        }
    }

    fn apply(&mut self, patch: HabitPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(frequency) = patch.frequency {
            self.frequency = frequency;
        }
        if let Some(time_of_day) = patch.time_of_day {
            self.time_of_day = time_of_day;
        }
        if let Some(streak) = patch.streak {
            self.streak = streak;
        }
        if let Some(completed_dates) = patch.completed_dates {
            self.completed_dates = completed_dates;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(reminder) = patch.reminder {
            self.reminder = reminder;
        }
    }
}

impl Searchable for Habit {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        crate::utils::parse_date(s).unwrap()
    }

    #[test]
    fn toggling_twice_restores_state() {
        let today = date("2024-05-10");
        let mut habit = Habit::with_id(1);
        habit.completed_dates.insert(date("2024-05-09"));

        assert!(habit.toggle_completion(today, today));
        assert_eq!(habit.streak, 2);

        assert!(!habit.toggle_completion(today, today));
        assert!(!habit.is_completed_on(today));
        assert_eq!(habit.streak, 0);
    }

    #[test]
    fn reads_camel_case_json() {
        let habit: Habit = serde_json::from_str(
            r#"{"id":9,"title":"Meditate","frequency":"daily","timeOfDay":"morning",
                "streak":0,"completedDates":["2024-05-09","2024-05-08"],
                "category":"wellness","created":"2024-05-01T08:00:00Z",
                "reminder":{"enabled":true,"time":"07:30:00"}}"#,
        )
        .unwrap();
        assert_eq!(habit.time_of_day, TimeOfDay::Morning);
        assert_eq!(habit.category, Category::Wellness);
        assert_eq!(habit.completed_dates.len(), 2);
        assert!(habit.reminder.enabled);
    }
}
