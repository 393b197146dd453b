use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::games::model::{Difficulty, GamePatch, GameRecord, NewGame};

/// Persistent collection of game records.
///
/// Every method except `create` is scoped by `owner_id`: a record owned by
/// someone else is reported exactly like a record that does not exist.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when `external_id` is already
    /// taken by any owner.
    async fn create(&self, owner_id: Uuid, game: NewGame) -> Result<GameRecord, StoreError>;

    /// Owner's records in insertion order.
    async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<GameRecord>, StoreError>;

    async fn find_one_by_owner(&self, owner_id: Uuid, id: Uuid) -> Result<GameRecord, StoreError>;

    async fn update_partial(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: GamePatch,
    ) -> Result<GameRecord, StoreError>;

    async fn set_visibility(
        &self,
        owner_id: Uuid,
        id: Uuid,
        is_public: bool,
    ) -> Result<bool, StoreError>;

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<GameRecord, StoreError>;

    /// Records of `owner_id` flagged public, in insertion order.
    async fn find_public_by_owner(&self, owner_id: Uuid) -> Result<Vec<GameRecord>, StoreError>;
}

#[derive(Debug, FromRow)]
struct GameRow {
    id: Uuid,
    owner_id: Uuid,
    external_id: i64,
    title: String,
    category: String,
    difficulty: String,
    hours_played: f64,
    progress_percent: f64,
    image_url: String,
    is_public: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<GameRow> for GameRecord {
    type Error = anyhow::Error;

    fn try_from(r: GameRow) -> Result<Self, Self::Error> {
        let difficulty = Difficulty::parse(&r.difficulty)
            .ok_or_else(|| anyhow!("unknown difficulty {:?} on game {}", r.difficulty, r.id))?;
        Ok(Self {
            id: r.id,
            owner_id: r.owner_id,
            external_id: r.external_id,
            title: r.title,
            category: r.category,
            difficulty,
            hours_played: r.hours_played,
            progress_percent: r.progress_percent,
            image_url: r.image_url,
            is_public: r.is_public,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const COLUMNS: &str = "id, owner_id, external_id, title, category, difficulty, hours_played, \
                       progress_percent, image_url, is_public, created_at, updated_at";

pub struct PgGameStore {
    db: PgPool,
}

impl PgGameStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_records(rows: Vec<GameRow>) -> Result<Vec<GameRecord>, StoreError> {
    rows.into_iter()
        .map(|r| GameRecord::try_from(r).map_err(StoreError::from))
        .collect()
}

fn found(row: Option<GameRow>) -> Result<GameRecord, StoreError> {
    let row = row.ok_or(StoreError::NotFound)?;
    Ok(GameRecord::try_from(row)?)
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn create(&self, owner_id: Uuid, game: NewGame) -> Result<GameRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO games (id, owner_id, external_id, title, category, difficulty,
                               hours_played, progress_percent, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        );
        let res = sqlx::query_as::<_, GameRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(game.external_id)
            .bind(&game.title)
            .bind(&game.category)
            .bind(game.difficulty.as_str())
            .bind(game.hours_played)
            .bind(game.progress_percent)
            .bind(&game.image_url)
            .fetch_one(&self.db)
            .await;

        match res {
            Ok(row) => Ok(GameRecord::try_from(row)?),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Duplicate {
                field: "externalId",
                value: game.external_id.to_string(),
            }),
            Err(e) => Err(anyhow::Error::new(e).context("insert game").into()),
        }
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<GameRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM games WHERE owner_id = $1 ORDER BY seq ASC");
        let rows = sqlx::query_as::<_, GameRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.db)
            .await
            .context("list games by owner")?;
        into_records(rows)
    }

    async fn find_one_by_owner(&self, owner_id: Uuid, id: Uuid) -> Result<GameRecord, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM games WHERE id = $1 AND owner_id = $2");
        let row = sqlx::query_as::<_, GameRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await
            .context("get game by owner")?;
        found(row)
    }

    async fn update_partial(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: GamePatch,
    ) -> Result<GameRecord, StoreError> {
        let sql = format!(
            r#"
            UPDATE games
               SET hours_played     = COALESCE($3, hours_played),
                   progress_percent = COALESCE($4, progress_percent),
                   difficulty       = COALESCE($5, difficulty),
                   updated_at       = now()
             WHERE id = $1 AND owner_id = $2
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, GameRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(patch.hours_played)
            .bind(patch.progress_percent)
            .bind(patch.difficulty.map(Difficulty::as_str))
            .fetch_optional(&self.db)
            .await
            .context("update game")?;
        found(row)
    }

    async fn set_visibility(
        &self,
        owner_id: Uuid,
        id: Uuid,
        is_public: bool,
    ) -> Result<bool, StoreError> {
        let flag = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE games
               SET is_public = $3, updated_at = now()
             WHERE id = $1 AND owner_id = $2
            RETURNING is_public
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(is_public)
        .fetch_optional(&self.db)
        .await
        .context("set game visibility")?;
        flag.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<GameRecord, StoreError> {
        let sql = format!("DELETE FROM games WHERE id = $1 AND owner_id = $2 RETURNING {COLUMNS}");
        let row = sqlx::query_as::<_, GameRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await
            .context("delete game")?;
        found(row)
    }

    async fn find_public_by_owner(&self, owner_id: Uuid) -> Result<Vec<GameRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM games WHERE owner_id = $1 AND is_public = TRUE ORDER BY seq ASC"
        );
        let rows = sqlx::query_as::<_, GameRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.db)
            .await
            .context("list public games")?;
        into_records(rows)
    }
}
