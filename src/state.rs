use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::users::repo::{PgUserRepository, UserRepository};
use crate::users::services::UserService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtKeys>,
    pub users: UserService,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let db_cfg = &config.database;
        let db = PgPoolOptions::new()
            .max_connections(db_cfg.max_connections)
            .min_connections(db_cfg.min_connections)
            .max_lifetime(db_cfg.max_lifetime())
            .connect(&db_cfg.connection_url())
            .await
            .context("connect to database")?;

        let repo = Arc::new(PgUserRepository::new(db.clone())) as Arc<dyn UserRepository>;
        Ok((Self::from_parts(Arc::new(config), repo), db))
    }

    pub fn from_parts(config: Arc<AppConfig>, repo: Arc<dyn UserRepository>) -> Self {
        let jwt = Arc::new(JwtKeys::from_config(&config.jwt));
        Self {
            config,
            jwt,
            users: UserService::new(repo),
        }
    }

    /// In-memory state for tests; no database involved.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::users::memory::InMemoryUserRepository;

        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".to_string()),
            _ => None,
        })
        .expect("test config");

        Self::from_parts(Arc::new(config), Arc::new(InMemoryUserRepository::new()))
    }
}
