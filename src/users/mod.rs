use crate::auth::extractors::require_bearer;
use crate::state::AppState;
use axum::{middleware, Router};

pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Every route here requires a valid access token.
pub fn router(state: AppState) -> Router<AppState> {
    handlers::user_routes().route_layer(middleware::from_fn_with_state(state, require_bearer))
}
