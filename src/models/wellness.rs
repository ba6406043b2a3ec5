use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::saturating_u8;
use crate::store::{Entity, EntityId, Searchable, contains_term};

const MIN_SCORE: u8 = 1;
const MAX_SCORE: u8 = 5;

fn clamp_score(score: u8) -> u8 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Self-assessed state for the day. Scores run 1 (low) to 5 (high).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessMetrics {
    #[serde(deserialize_with = "saturating_u8")]
    pub mood: u8,
    #[serde(deserialize_with = "saturating_u8")]
    pub energy: u8,
    #[serde(deserialize_with = "saturating_u8")]
    pub stress: u8,
    /// Hours slept
    pub sleep: f64,
}

impl WellnessMetrics {
    fn clamped(self) -> Self {
        Self {
            mood: clamp_score(self.mood),
            energy: clamp_score(self.energy),
            stress: clamp_score(self.stress),
            sleep: self.sleep.clamp(0.0, 24.0),
        }
    }
}

impl Default for WellnessMetrics {
    fn default() -> Self {
        Self {
            mood: 3,
            energy: 3,
            stress: 3,
            sleep: 7.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessActivities {
    /// Minutes
    #[serde(default)]
    pub meditation: u32,
    /// Minutes
    #[serde(default)]
    pub exercise: u32,
    /// Glasses
    #[serde(default)]
    pub water_intake: u32,
    #[serde(deserialize_with = "saturating_u8")]
    pub nutrition: u8,
}

impl WellnessActivities {
    fn clamped(self) -> Self {
        Self {
            nutrition: clamp_score(self.nutrition),
            ..self
        }
    }
}

impl Default for WellnessActivities {
    fn default() -> Self {
        Self {
            meditation: 0,
            exercise: 0,
            water_intake: 0,
            nutrition: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessLog {
    pub id: EntityId,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub metrics: WellnessMetrics,
    #[serde(default)]
    pub activities: WellnessActivities,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WellnessLogPatch {
    pub date: Option<DateTime<Utc>>,
    pub metrics: Option<WellnessMetrics>,
    pub activities: Option<WellnessActivities>,
    pub notes: Option<String>,
    pub tags: Option<BTreeSet<String>>,
}

impl Entity for WellnessLog {
    const COLLECTION: &'static str = "wellness-logs";
    type Patch = WellnessLogPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.notes
    }

    fn with_id(id: EntityId) -> Self {
        WellnessLog {
            id,
            date: Utc::now(),
            metrics: WellnessMetrics::default(),
            activities: WellnessActivities::default(),
            notes: String::new(),
            tags: BTreeSet::new(),
        }
    }

    fn apply(&mut self, patch: WellnessLogPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(metrics) = patch.metrics {
            self.metrics = metrics.clamped();
        }
        if let Some(activities) = patch.activities {
            self.activities = activities.clamped();
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    fn normalize(&mut self) {
        self.metrics = self.metrics.clamped();
        self.activities = self.activities.clamped();
    }
}

impl Searchable for WellnessLog {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.notes, term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_clamped_to_scale() {
        let mut log = WellnessLog::with_id(1);
        log.apply(WellnessLogPatch {
            metrics: Some(WellnessMetrics {
                mood: 0,
                energy: 9,
                stress: 2,
                sleep: 30.0,
            }),
            activities: Some(WellnessActivities {
                nutrition: 7,
                exercise: 45,
                ..WellnessActivities::default()
            }),
            ..WellnessLogPatch::default()
        });
        assert_eq!(log.metrics.mood, 1);
        assert_eq!(log.metrics.energy, 5);
        assert_eq!(log.metrics.stress, 2);
        assert_eq!(log.metrics.sleep, 24.0);
        assert_eq!(log.activities.nutrition, 5);
        assert_eq!(log.activities.exercise, 45);
    }

    #[test]
    fn defaults_match_new_log_form() {
        let log = WellnessLog::with_id(1);
        assert_eq!(log.metrics.mood, 3);
        assert_eq!(log.metrics.sleep, 7.0);
        assert_eq!(log.activities.nutrition, 3);
    }
}
