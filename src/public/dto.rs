use serde::Serialize;

use crate::games::model::{Difficulty, GameRecord};

/// The only shape a record ever takes on the public channel. Owner, internal
/// id, the visibility flag and timestamps are deliberately absent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicGame {
    pub external_id: i64,
    pub title: String,
    pub progress_percent: f64,
    pub difficulty: Difficulty,
    pub hours_played: f64,
    pub is_completed: bool,
    pub image_url: String,
}

impl From<GameRecord> for PublicGame {
    fn from(g: GameRecord) -> Self {
        Self {
            is_completed: g.is_completed(),
            external_id: g.external_id,
            title: g.title,
            progress_percent: g.progress_percent,
            difficulty: g.difficulty,
            hours_played: g.hours_played,
            image_url: g.image_url,
        }
    }
}
