//! Entity definitions, one module per entity family.
//!
//! Every entity serializes with camelCase field names and kebab-case enum
//! values, matching the JSON kept in the durable slots.

mod goal;
mod habit;
mod mind_map;
mod note;
mod reflection;
mod reminder;
mod resource;
mod task;
mod time_entry;
mod wellness;

pub use goal::{Goal, GoalPatch, GoalSortKey, GoalStatus, Milestone, MilestonePatch};
pub use habit::{Frequency, Habit, HabitPatch, HabitReminder, TimeOfDay};
pub use mind_map::{MindMap, MindMapEdge, MindMapNode, MindMapPatch, NodeKind};
pub use note::{Doc, DocPatch, Note, NotePatch};
pub use reflection::{Mood, Reflection, ReflectionPatch, ReflectionSortKey};
pub use reminder::{
    Reminder, ReminderFilter, ReminderPatch, ReminderSortKey, ReminderStatus, Repeat,
};
pub use resource::{Resource, ResourcePatch, ResourceSortKey, ResourceStatus, ResourceType};
pub use task::{Task, TaskPatch, TaskSortKey, TaskTag};
pub use time_entry::{TimeEntry, TimeEntryPatch, TimeEntrySortKey};
pub use wellness::{WellnessActivities, WellnessLog, WellnessLogPatch, WellnessMetrics};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Area of personal development an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Learning,
    Wellness,
    SkillBuilding,
    Habits,
    Reading,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Learning,
        Category::Wellness,
        Category::SkillBuilding,
        Category::Habits,
        Category::Reading,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Learning => "learning",
            Category::Wellness => "wellness",
            Category::SkillBuilding => "skill-building",
            Category::Habits => "habits",
            Category::Reading => "reading",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Position in "most pressing first" order
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Read any JSON number into a `u8`, saturating at both ends, so one
/// out-of-range score never makes a whole collection unreadable
pub(crate) fn saturating_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, f64::from(u8::MAX)) as u8)
}

/// Clamp a percentage into 0..=100
pub fn clamp_percent(value: u8) -> u8 {
    value.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_its_name() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(
            serde_json::to_string(&Category::SkillBuilding).unwrap(),
            "\"skill-building\""
        );
        assert!("chores".parse::<Category>().is_err());
    }

    #[test]
    fn high_priority_ranks_first() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }
}
