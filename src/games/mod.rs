mod dto;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod repo;
mod services;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
