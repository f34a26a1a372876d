//! Scorecard structure and assembly from per-entry results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::rubric::{RUBRIC, RubricEntry};

/// Details text used for entries without a result.
pub const NO_ANALYSIS: &str = "No analysis available";
/// Score used for entries without a result.
pub const DEFAULT_ENTRY_SCORE: u8 = 50;

/// Qualitative label derived from a score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    /// 90 and above.
    Excellent,
    /// 70 to 89.
    Good,
    /// 50 to 69.
    Warning,
    /// Below 50.
    Error,
}

impl ScoreStatus {
    /// Label for a score.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => ScoreStatus::Excellent,
            70..=89 => ScoreStatus::Good,
            50..=69 => ScoreStatus::Warning,
            _ => ScoreStatus::Error,
        }
    }

    /// Human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStatus::Excellent => "excellent",
            ScoreStatus::Good => "good",
            ScoreStatus::Warning => "warning",
            ScoreStatus::Error => "error",
        }
    }
}

/// Score and rationale for one rubric entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryScore {
    /// Score in `0..=100`.
    pub score: u8,
    /// Free-text rationale.
    pub details: String,
}

impl EntryScore {
    /// Build a result from an integral score.
    pub fn new(score: u8, details: impl Into<String>) -> Self {
        Self {
            score: score.min(100),
            details: details.into(),
        }
    }

    /// Build a result from a raw numeric score, clamped to `0..=100` and floored.
    pub fn from_raw(score: f64, details: impl Into<String>) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 100.0).floor()
        };
        Self::new(score as u8, details)
    }
}

/// Results keyed by rubric entry id.
pub type EntryScores = BTreeMap<u32, EntryScore>;

/// One `{label: score}` choice in the serialized scorecard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreChoice {
    /// Qualitative label.
    pub label: String,
    /// Score awarded for the label.
    pub score: u8,
}

impl Serialize for ScoreChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.score)?;
        map.end()
    }
}

/// Entity the scorecard describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    /// Always `component`.
    pub kind: String,
    /// Component name.
    pub name: String,
}

/// Expanded rubric entry with its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    /// Rubric entry id.
    pub id: u32,
    /// Rubric entry title.
    pub title: String,
    /// Entry score.
    pub score_percent: u8,
    /// Entry status label.
    pub score_success: ScoreStatus,
    /// Rubric guidance.
    pub how_to_score: String,
    /// Rubric choices.
    pub score_choices: Vec<ScoreChoice>,
    /// Rationale text.
    pub details: String,
}

/// Rollup for one rubric area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaScore {
    /// Area id.
    pub id: u32,
    /// Area title.
    pub title: String,
    /// Floor mean of the entry scores.
    pub score_percent: u8,
    /// Area status label.
    pub score_success: ScoreStatus,
    /// Entries in rubric order.
    pub score_entries: Vec<ScoreEntry>,
}

/// The complete scorecard written to `component-score.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    /// Described entity.
    pub entity_ref: EntityRef,
    /// Generation time, `YYYY-MM-DD HH:MM` in UTC.
    pub generated_date_time_utc: String,
    /// Floor mean of the area scores.
    pub score_percent: u8,
    /// Overall status label.
    pub score_success: ScoreStatus,
    /// Areas in rubric order.
    pub area_scores: Vec<AreaScore>,
}

impl Scorecard {
    /// Serialize as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Expand per-entry results into a full scorecard.
///
/// Entries missing from `scores` receive [`DEFAULT_ENTRY_SCORE`] and
/// [`NO_ANALYSIS`]. Results for ids outside the rubric are ignored.
pub fn assemble(component: &str, scores: &EntryScores, generated_at: DateTime<Utc>) -> Scorecard {
    let area_scores: Vec<AreaScore> = RUBRIC
        .iter()
        .map(|area| {
            let score_entries: Vec<ScoreEntry> = area
                .entries
                .iter()
                .map(|entry| expand_entry(entry, scores.get(&entry.id)))
                .collect();
            let entry_scores: Vec<u8> = score_entries.iter().map(|e| e.score_percent).collect();
            let score_percent = floor_mean(&entry_scores);
            AreaScore {
                id: area.id,
                title: area.title.to_string(),
                score_percent,
                score_success: ScoreStatus::from_score(score_percent),
                score_entries,
            }
        })
        .collect();

    let area_means: Vec<u8> = area_scores.iter().map(|a| a.score_percent).collect();
    let score_percent = floor_mean(&area_means);

    Scorecard {
        entity_ref: EntityRef {
            kind: "component".to_string(),
            name: component.to_string(),
        },
        generated_date_time_utc: generated_at.format("%Y-%m-%d %H:%M").to_string(),
        score_percent,
        score_success: ScoreStatus::from_score(score_percent),
        area_scores,
    }
}

/// Integer mean rounded down; zero for an empty slice.
pub fn floor_mean(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let total: u32 = values.iter().map(|value| u32::from(*value)).sum();
    (total / values.len() as u32) as u8
}

fn expand_entry(entry: &RubricEntry, result: Option<&EntryScore>) -> ScoreEntry {
    let (score, details) = match result {
        Some(result) => (result.score, result.details.clone()),
        None => (DEFAULT_ENTRY_SCORE, NO_ANALYSIS.to_string()),
    };
    ScoreEntry {
        id: entry.id,
        title: entry.title.to_string(),
        score_percent: score,
        score_success: ScoreStatus::from_score(score),
        how_to_score: entry.how_to_score.to_string(),
        score_choices: entry
            .choices
            .iter()
            .map(|(label, score)| ScoreChoice {
                label: (*label).to_string(),
                score: *score,
            })
            .collect(),
        details,
    }
}
