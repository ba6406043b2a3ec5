use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Entity, EntityId, Searchable, contains_term};

/// A short rich-text note. `content` is HTML as produced by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Free-form label chosen by the user ("meeting", "project", ...)
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag: Option<String>,
}

impl Entity for Note {
    const COLLECTION: &'static str = "notes";
    type Patch = NotePatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Note {
            id,
            title: String::new(),
            content: String::new(),
            tag: String::new(),
            last_updated: Some(Utc::now()),
        }
    }

    fn apply(&mut self, patch: NotePatch) {
        let touched = patch.title.is_some() || patch.content.is_some();
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tag) = patch.tag {
            self.tag = tag;
        }
        if touched {
            self.last_updated = Some(Utc::now());
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            Note {
                id: 1,
                title: "Team Meeting Notes".to_string(),
                content: "<p>Key points discussed:</p><ul><li>Project timeline</li><li>Resource allocation</li></ul>".to_string(),
                tag: "meeting".to_string(),
                last_updated: None,
            },
            Note {
                id: 2,
                title: "Project Requirements".to_string(),
                content: "<p>Requirements gathering for new features:</p><ol><li>User authentication</li><li>Dashboard redesign</li></ol>".to_string(),
                tag: "project".to_string(),
                last_updated: None,
            },
        ]
    }
}

impl Searchable for Note {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term) || contains_term(&self.content, term)
    }
}

/// A longer document, grouped by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doc {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_doc_category")]
    pub category: String,
    pub last_updated: DateTime<Utc>,
}

fn default_doc_category() -> String {
    "general".to_string()
}

#[derive(Debug, Clone, Default)]
pub struct DocPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

impl Entity for Doc {
    const COLLECTION: &'static str = "docs";
    type Patch = DocPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        Doc {
            id,
            title: String::new(),
            content: String::new(),
            category: default_doc_category(),
            last_updated: Utc::now(),
        }
    }

    // Any edit counts as an update of the document
    fn apply(&mut self, patch: DocPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        self.last_updated = Utc::now();
    }
}

impl Searchable for Doc {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term) || contains_term(&self.content, term)
    }
}
