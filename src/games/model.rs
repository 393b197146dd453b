use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

/// A tracked game, owned by exactly one user for its whole life.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub external_id: i64,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub hours_played: f64,
    pub progress_percent: f64,
    pub image_url: String,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl GameRecord {
    /// Computed on every read; never stored.
    pub fn is_completed(&self) -> bool {
        self.progress_percent == 100.0
    }
}

/// Validated create payload with every default resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub external_id: i64,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub hours_played: f64,
    pub progress_percent: f64,
    pub image_url: String,
}

/// Validated partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamePatch {
    pub hours_played: Option<f64>,
    pub progress_percent: Option<f64>,
    pub difficulty: Option<Difficulty>,
}

impl GamePatch {
    pub fn apply(&self, record: &mut GameRecord) {
        if let Some(hours) = self.hours_played {
            record.hours_played = hours;
        }
        if let Some(progress) = self.progress_percent {
            record.progress_percent = progress;
        }
        if let Some(difficulty) = self.difficulty {
            record.difficulty = difficulty;
        }
    }
}

pub fn default_image_url(template: &str, external_id: i64) -> String {
    template.replace("{externalId}", &external_id.to_string())
}
