mod app;
mod auth;
mod config;
mod error;
mod state;
mod users;
mod validation;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Fails fast without JWT_SECRET.
    let config = AppConfig::from_env()?;

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!(
            "userhub={},axum=info,tower_http=info,sqlx=warn",
            config.log.level
        )
    });

    if config.log.json {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let server = config.server.clone();
    let (app_state, db) = AppState::init(config).await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    app::serve(app::build_app(app_state), &server).await
}
