use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{Difficulty, GameRecord};

/// Owner-channel view of a record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: Uuid,
    pub external_id: i64,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub hours_played: f64,
    pub progress_percent: f64,
    pub image_url: String,
    pub is_completed: bool,
    pub is_public: bool,
    pub owner: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<GameRecord> for GameResponse {
    fn from(g: GameRecord) -> Self {
        Self {
            is_completed: g.is_completed(),
            id: g.id,
            external_id: g.external_id,
            title: g.title,
            category: g.category,
            difficulty: g.difficulty,
            hours_played: g.hours_played,
            progress_percent: g.progress_percent,
            image_url: g.image_url,
            is_public: g.is_public,
            owner: g.owner_id,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResponse {
    pub is_public: bool,
}
