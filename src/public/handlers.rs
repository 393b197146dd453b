use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::dto::PublicGame;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/public/games/:owner_id", get(list_public_games))
}

/// An owner with no public records, or no records at all, gets `200 []`.
#[instrument(skip(state))]
pub async fn list_public_games(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<PublicGame>>, AppError> {
    let owner_id = Uuid::parse_str(&owner_id).map_err(|_| AppError::InvalidIdentity)?;
    let games = state.games.find_public_by_owner(owner_id).await?;
    debug!(%owner_id, count = games.len(), "public games served");
    Ok(Json(games.into_iter().map(PublicGame::from).collect()))
}
