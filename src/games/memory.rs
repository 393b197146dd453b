use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::games::model::{GamePatch, GameRecord, NewGame};
use crate::games::repo::GameStore;

/// Process-local [`GameStore`]. The duplicate check and the insert share one
/// write lock, so concurrent creates of the same external id cannot both win.
#[derive(Default)]
pub struct MemoryGameStore {
    games: RwLock<Vec<GameRecord>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(g: &GameRecord, owner_id: Uuid, id: Uuid) -> bool {
    g.id == id && g.owner_id == owner_id
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn create(&self, owner_id: Uuid, game: NewGame) -> Result<GameRecord, StoreError> {
        let mut games = self.games.write().await;
        if games.iter().any(|g| g.external_id == game.external_id) {
            return Err(StoreError::Duplicate {
                field: "externalId",
                value: game.external_id.to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let record = GameRecord {
            id: Uuid::new_v4(),
            owner_id,
            external_id: game.external_id,
            title: game.title,
            category: game.category,
            difficulty: game.difficulty,
            hours_played: game.hours_played,
            progress_percent: game.progress_percent,
            image_url: game.image_url,
            is_public: false,
            created_at: now,
            updated_at: now,
        };
        games.push(record.clone());
        Ok(record)
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<GameRecord>, StoreError> {
        let games = self.games.read().await;
        Ok(games
            .iter()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_one_by_owner(&self, owner_id: Uuid, id: Uuid) -> Result<GameRecord, StoreError> {
        let games = self.games.read().await;
        games
            .iter()
            .find(|g| owned_by(g, owner_id, id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_partial(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: GamePatch,
    ) -> Result<GameRecord, StoreError> {
        let mut games = self.games.write().await;
        let game = games
            .iter_mut()
            .find(|g| owned_by(g, owner_id, id))
            .ok_or(StoreError::NotFound)?;
        patch.apply(game);
        game.updated_at = OffsetDateTime::now_utc();
        Ok(game.clone())
    }

    async fn set_visibility(
        &self,
        owner_id: Uuid,
        id: Uuid,
        is_public: bool,
    ) -> Result<bool, StoreError> {
        let mut games = self.games.write().await;
        let game = games
            .iter_mut()
            .find(|g| owned_by(g, owner_id, id))
            .ok_or(StoreError::NotFound)?;
        game.is_public = is_public;
        game.updated_at = OffsetDateTime::now_utc();
        Ok(game.is_public)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<GameRecord, StoreError> {
        let mut games = self.games.write().await;
        let idx = games
            .iter()
            .position(|g| owned_by(g, owner_id, id))
            .ok_or(StoreError::NotFound)?;
        Ok(games.remove(idx))
    }

    async fn find_public_by_owner(&self, owner_id: Uuid) -> Result<Vec<GameRecord>, StoreError> {
        let games = self.games.read().await;
        Ok(games
            .iter()
            .filter(|g| g.owner_id == owner_id && g.is_public)
            .cloned()
            .collect())
    }
}
