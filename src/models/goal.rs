use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use super::{Category, clamp_percent, saturating_u8};
use crate::metrics::completion_percentage;
use crate::store::{Entity, EntityId, Searchable, SortKey, cmp_present_first, cmp_text, contains_term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// A checkpoint owned by exactly one goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: EntityId,
    pub goal_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default, deserialize_with = "saturating_u8")]
    pub progress: u8,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<Option<NaiveDate>>,
    pub progress: Option<u8>,
    pub status: Option<GoalStatus>,
    pub category: Option<Option<Category>>,
    pub milestones: Option<Vec<Milestone>>,
}

impl Goal {
    /// Append a milestone and return its id
    pub fn add_milestone(
        &mut self,
        title: impl Into<String>,
        due_date: Option<NaiveDate>,
    ) -> EntityId {
        let id = self.next_milestone_id();
        self.milestones.push(Milestone {
            id,
            goal_id: self.id,
            title: title.into(),
            due_date,
            completed: false,
            description: String::new(),
        });
        id
    }

    /// Merge `patch` into one milestone; `false` if the goal has no such milestone
    pub fn update_milestone(&mut self, milestone_id: EntityId, patch: MilestonePatch) -> bool {
        let Some(milestone) = self.milestones.iter_mut().find(|m| m.id == milestone_id) else {
            return false;
        };
        if let Some(title) = patch.title {
            milestone.title = title;
        }
        if let Some(due_date) = patch.due_date {
            milestone.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            milestone.completed = completed;
        }
        if let Some(description) = patch.description {
            milestone.description = description;
        }
        true
    }

    /// Share of completed milestones, 0 when there are none
    pub fn milestone_progress(&self) -> u8 {
        let done = self.milestones.iter().filter(|m| m.completed).count();
        completion_percentage(done, self.milestones.len())
    }

    fn next_milestone_id(&self) -> EntityId {
        let now = chrono::Utc::now().timestamp_millis();
        let floor = self.milestones.iter().map(|m| m.id + 1).max().unwrap_or(1);
        now.max(floor)
    }

    // Milestones always point back at their owner, whatever the caller passed
    fn adopt_milestones(&mut self) {
        let owner = self.id;
        for milestone in &mut self.milestones {
            milestone.goal_id = owner;
        }
    }
}

impl Entity for Goal {
    const COLLECTION: &'static str = "goals";
    type Patch = GoalPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Goal {
            id,
            title: String::new(),
            description: String::new(),
            deadline: None,
            progress: 0,
            status: GoalStatus::NotStarted,
            category: None,
            milestones: Vec::new(),
        }
    }

    fn apply(&mut self, patch: GoalPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(progress) = patch.progress {
            self.progress = clamp_percent(progress);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(milestones) = patch.milestones {
            self.milestones = milestones;
            self.adopt_milestones();
        }
    }

    fn on_create(&mut self) {
        self.adopt_milestones();
    }

    fn normalize(&mut self) {
        self.progress = clamp_percent(self.progress);
        self.adopt_milestones();
    }
}

impl Searchable for Goal {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalSortKey {
    Deadline,
    Title,
    Progress,
}

impl SortKey<Goal> for GoalSortKey {
    fn compare(&self, a: &Goal, b: &Goal) -> Ordering {
        match self {
            GoalSortKey::Deadline => cmp_present_first(&a.deadline, &b.deadline),
            GoalSortKey::Title => cmp_text(&a.title, &b.title),
            GoalSortKey::Progress => a.progress.cmp(&b.progress),
        }
    }
}

impl FromStr for GoalSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deadline" | "due" => Ok(GoalSortKey::Deadline),
            "title" => Ok(GoalSortKey::Title),
            "progress" => Ok(GoalSortKey::Progress),
            other => Err(format!("Unknown goal sort key: {}", other)),
        }
    }
}
