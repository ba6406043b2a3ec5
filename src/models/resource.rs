use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use super::{Category, Priority, clamp_percent, saturating_u8};
use crate::store::{Entity, EntityId, Searchable, SortKey, cmp_text, contains_term};

const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    #[default]
    Book,
    Course,
    Video,
    Article,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceStatus {
    InProgress,
    #[default]
    NotStarted,
    Completed,
    OnHold,
}

impl ResourceStatus {
    /// Library ordering: in-progress < not-started < completed < on-hold
    pub fn rank(&self) -> u8 {
        match self {
            ResourceStatus::InProgress => 0,
            ResourceStatus::NotStarted => 1,
            ResourceStatus::Completed => 2,
            ResourceStatus::OnHold => 3,
        }
    }
}

/// A learning resource: book, course, video...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: EntityId,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ResourceType,
    #[serde(default = "default_resource_category")]
    pub category: Category,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "saturating_u8")]
    pub progress: u8,
    #[serde(default)]
    pub status: ResourceStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "saturating_u8")]
    pub rating: u8,
    /// Minutes spent so far
    #[serde(default)]
    pub time_spent: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

fn default_resource_category() -> Category {
    Category::Learning
}

#[derive(Debug, Clone, Default)]
pub struct ResourcePatch {
    pub title: Option<String>,
    pub kind: Option<ResourceType>,
    pub category: Option<Category>,
    pub url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub progress: Option<u8>,
    pub status: Option<ResourceStatus>,
    pub priority: Option<Priority>,
    pub rating: Option<u8>,
    pub time_spent: Option<u32>,
    pub tags: Option<BTreeSet<String>>,
}

impl Entity for Resource {
    const COLLECTION: &'static str = "resources";
    type Patch = ResourcePatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Resource {
            id,
            title: String::new(),
            kind: ResourceType::Book,
            category: default_resource_category(),
            url: None,
            notes: None,
            start_date: Some(crate::utils::today()),
            progress: 0,
            status: ResourceStatus::NotStarted,
            priority: Priority::Medium,
            rating: 0,
            time_spent: 0,
            tags: BTreeSet::new(),
        }
    }

    fn apply(&mut self, patch: ResourcePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(progress) = patch.progress {
            self.progress = clamp_percent(progress);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating.min(MAX_RATING);
        }
        if let Some(time_spent) = patch.time_spent {
            self.time_spent = time_spent;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    fn normalize(&mut self) {
        self.progress = clamp_percent(self.progress);
        self.rating = self.rating.min(MAX_RATING);
    }
}

impl Searchable for Resource {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSortKey {
    /// Status table, then priority, then most progressed first
    Library,
    Status,
    Priority,
    Progress,
    Title,
}

impl SortKey<Resource> for ResourceSortKey {
    fn compare(&self, a: &Resource, b: &Resource) -> Ordering {
        match self {
            ResourceSortKey::Library => a
                .status
                .rank()
                .cmp(&b.status.rank())
                .then(a.priority.rank().cmp(&b.priority.rank()))
                .then(b.progress.cmp(&a.progress)),
            ResourceSortKey::Status => a.status.rank().cmp(&b.status.rank()),
            ResourceSortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            ResourceSortKey::Progress => a.progress.cmp(&b.progress),
            ResourceSortKey::Title => cmp_text(&a.title, &b.title),
        }
    }
}

impl FromStr for ResourceSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "library" | "default" => Ok(ResourceSortKey::Library),
            "status" => Ok(ResourceSortKey::Status),
            "priority" => Ok(ResourceSortKey::Priority),
            "progress" => Ok(ResourceSortKey::Progress),
            "title" => Ok(ResourceSortKey::Title),
            other => Err(format!("Unknown resource sort key: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SortDirection, sort_slice};

    fn resource(id: EntityId, status: ResourceStatus, priority: Priority, progress: u8) -> Resource {
        let mut r = Resource::with_id(id);
        r.status = status;
        r.priority = priority;
        r.progress = progress;
        r
    }

    #[test]
    fn library_order() {
        let mut items = vec![
            resource(1, ResourceStatus::OnHold, Priority::High, 10),
            resource(2, ResourceStatus::Completed, Priority::Low, 100),
            resource(3, ResourceStatus::NotStarted, Priority::Low, 0),
            resource(4, ResourceStatus::InProgress, Priority::Low, 80),
            resource(5, ResourceStatus::InProgress, Priority::High, 20),
            resource(6, ResourceStatus::InProgress, Priority::High, 60),
        ];
        sort_slice(&mut items, &ResourceSortKey::Library, SortDirection::Asc);
        let ids: Vec<EntityId> = items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn rating_and_progress_are_clamped() {
        let mut r = Resource::with_id(1);
        r.apply(ResourcePatch {
            rating: Some(9),
            progress: Some(140),
            ..ResourcePatch::default()
        });
        assert_eq!(r.rating, 5);
        assert_eq!(r.progress, 100);
    }

    #[test]
    fn kind_serializes_as_type() {
        let json = serde_json::to_value(Resource::with_id(1)).unwrap();
        assert_eq!(json["type"], "book");
        assert_eq!(json["status"], "not-started");
    }
}
