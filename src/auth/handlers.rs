use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::{LoginRequest, RefreshRequest, SignupRequest, TokenResponse},
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::{PublicUser, User},
    validation::ValidatedJson,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

fn issue_pair(state: &AppState, user: &User) -> AppResult<TokenResponse> {
    let access_token = state.jwt.sign_access(user.id, user.role)?;
    let refresh_token = state.jwt.sign_refresh(user.id)?;
    Ok(TokenResponse {
        user_id: user.id,
        role: user.role,
        access_token,
        refresh_token,
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = state
        .users
        .create_user(
            &payload.email,
            &payload.password,
            &payload.first_name,
            &payload.last_name,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = state
        .users
        .login_user(&payload.email, &payload.password)
        .await?;
    Ok(Json(issue_pair(&state, &user)?))
}

/// Trades a refresh token for a fresh pair. The role comes from the stored
/// user, not the token.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let claims = state.jwt.verify_refresh(&payload.refresh_token)?;

    let user = match state.users.get_user_by_id(claims.sub).await {
        Ok(u) => u,
        Err(AppError::UserNotFound) => {
            warn!(user_id = %claims.sub, "refresh for missing user");
            return Err(AppError::TokenInvalid);
        }
        Err(e) => return Err(e),
    };

    info!(user_id = %user.id, "tokens refreshed");
    Ok(Json(issue_pair(&state, &user)?))
}
