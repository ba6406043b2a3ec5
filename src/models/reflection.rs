use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::collections::BTreeSet;

use super::Category;
use crate::store::{Entity, EntityId, Searchable, SortKey, cmp_text, contains_term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// A journal-style look back, optionally tied to a goal or habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub id: EntityId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub learnings: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default = "default_reflection_category")]
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub linked_goal_id: Option<EntityId>,
    #[serde(default)]
    pub linked_habit_id: Option<EntityId>,
}

fn default_reflection_category() -> Category {
    Category::Learning
}

#[derive(Debug, Clone, Default)]
pub struct ReflectionPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub learnings: Option<Vec<String>>,
    pub next_steps: Option<Vec<String>>,
    pub category: Option<Category>,
    pub tags: Option<BTreeSet<String>>,
    pub linked_goal_id: Option<Option<EntityId>>,
    pub linked_habit_id: Option<Option<EntityId>>,
}

impl Entity for Reflection {
    const COLLECTION: &'static str = "reflections";
    type Patch = ReflectionPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Reflection {
            id,
            title: String::new(),
            date: crate::utils::today(),
            content: String::new(),
            mood: Mood::Neutral,
            learnings: Vec::new(),
            next_steps: Vec::new(),
            category: default_reflection_category(),
            tags: BTreeSet::new(),
            linked_goal_id: None,
            linked_habit_id: None,
        }
    }

    fn apply(&mut self, patch: ReflectionPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
        if let Some(learnings) = patch.learnings {
            self.learnings = learnings;
        }
        if let Some(next_steps) = patch.next_steps {
            self.next_steps = next_steps;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(linked_goal_id) = patch.linked_goal_id {
            self.linked_goal_id = linked_goal_id;
        }
        if let Some(linked_habit_id) = patch.linked_habit_id {
            self.linked_habit_id = linked_habit_id;
        }
    }
}

impl Searchable for Reflection {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionSortKey {
    Date,
    Title,
}

impl SortKey<Reflection> for ReflectionSortKey {
    fn compare(&self, a: &Reflection, b: &Reflection) -> Ordering {
        match self {
            ReflectionSortKey::Date => a.date.cmp(&b.date),
            ReflectionSortKey::Title => cmp_text(&a.title, &b.title),
        }
    }
}

impl FromStr for ReflectionSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(ReflectionSortKey::Date),
            "title" => Ok(ReflectionSortKey::Title),
            other => Err(format!("Unknown reflection sort key: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SortDirection, sort_slice};

    #[test]
    fn newest_first_with_descending_date() {
        let mut items: Vec<Reflection> = ["2024-01-03", "2024-03-01", "2024-02-10"]
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let mut r = Reflection::with_id(i as EntityId);
                r.date = crate::utils::parse_date(d).unwrap();
                r
            })
            .collect();
        sort_slice(&mut items, &ReflectionSortKey::Date, SortDirection::Desc);
        let ids: Vec<EntityId> = items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn links_can_be_cleared() {
        let mut r = Reflection::with_id(1);
        r.apply(ReflectionPatch {
            linked_goal_id: Some(Some(5)),
            ..ReflectionPatch::default()
        });
        assert_eq!(r.linked_goal_id, Some(5));
        r.apply(ReflectionPatch {
            linked_goal_id: Some(None),
            ..ReflectionPatch::default()
        });
        assert_eq!(r.linked_goal_id, None);
    }
}
