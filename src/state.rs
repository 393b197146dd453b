use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::auth::repo::{MemoryUserStore, PgUserStore, UserStore};
use crate::config::{AppConfig, StoreBackend};
use crate::games::memory::MemoryGameStore;
use crate::games::repo::{GameStore, PgGameStore};
use crate::games::validation::GameValidator;

#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<JwtKeys>,
    pub validator: Arc<GameValidator>,
    pub users: Arc<dyn UserStore>,
    pub games: Arc<dyn GameStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        match &config.store {
            StoreBackend::Postgres {
                database_url,
                max_connections,
            } => {
                let db = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(database_url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!(max_connections, "postgres store ready");

                let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
                let games = Arc::new(PgGameStore::new(db)) as Arc<dyn GameStore>;
                Ok(Self::from_parts(config, users, games))
            }
            StoreBackend::Memory => {
                warn!("using in-memory store; data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryGameStore::new()),
        )
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        games: Arc<dyn GameStore>,
    ) -> Self {
        let keys = Arc::new(JwtKeys::from_config(&config.jwt));
        let validator = Arc::new(GameValidator::new(config.games));
        Self {
            keys,
            validator,
            users,
            games,
        }
    }
}
