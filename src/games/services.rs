use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::games::model::GameRecord;
use crate::state::AppState;

#[instrument(skip(st, body))]
pub async fn create_game(st: &AppState, owner_id: Uuid, body: &Value) -> Result<GameRecord, AppError> {
    let game = st.validator.validate_create(body)?;
    let record = st.games.create(owner_id, game).await?;
    info!(game_id = %record.id, external_id = record.external_id, "game created");
    Ok(record)
}

pub async fn list_games(st: &AppState, owner_id: Uuid) -> Result<Vec<GameRecord>, AppError> {
    Ok(st.games.find_all_by_owner(owner_id).await?)
}

pub async fn get_game(st: &AppState, owner_id: Uuid, id: Uuid) -> Result<GameRecord, AppError> {
    Ok(st.games.find_one_by_owner(owner_id, id).await?)
}

#[instrument(skip(st, body))]
pub async fn update_game(
    st: &AppState,
    owner_id: Uuid,
    id: Uuid,
    body: &Value,
) -> Result<GameRecord, AppError> {
    let patch = st.validator.validate_update(body)?;
    let record = st.games.update_partial(owner_id, id, patch).await?;
    info!(game_id = %record.id, progress = record.progress_percent, "game updated");
    Ok(record)
}

#[instrument(skip(st, body))]
pub async fn set_visibility(
    st: &AppState,
    owner_id: Uuid,
    id: Uuid,
    body: &Value,
) -> Result<bool, AppError> {
    let is_public = st.validator.validate_visibility(body)?;
    let is_public = st.games.set_visibility(owner_id, id, is_public).await?;
    info!(game_id = %id, is_public, "game visibility changed");
    Ok(is_public)
}

#[instrument(skip(st))]
pub async fn delete_game(st: &AppState, owner_id: Uuid, id: Uuid) -> Result<GameRecord, AppError> {
    let record = st.games.delete(owner_id, id).await?;
    info!(game_id = %record.id, external_id = record.external_id, "game deleted");
    Ok(record)
}
