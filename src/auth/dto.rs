use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::error::FieldErrors;
use crate::users::repo_types::Role;
use crate::validation::{Checker, Validate};

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        Checker::new()
            .required(&self.email, "email")
            .email(&self.email, "email")
            .present(&self.password, "password")
            .min_len(&self.password, MIN_PASSWORD_LENGTH, "password")
            .required(&self.first_name, "first_name")
            .required(&self.last_name, "last_name")
            .finish()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        Checker::new()
            .required(&self.email, "email")
            .email(&self.email, "email")
            .present(&self.password, "password")
            .min_len(&self.password, MIN_PASSWORD_LENGTH, "password")
            .finish()
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        Checker::new()
            .required(&self.refresh_token, "refresh_token")
            .finish()
    }
}

/// Returned by login and refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub access_token: String,
    pub refresh_token: String,
}
