use serde::Deserialize;

use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::error::FieldErrors;
use crate::users::repo_types::Role;
use crate::validation::{Checker, Validate};

/// PATCH body; absent fields stay as they are.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    /// Only meaningful after [`Validate::validate`] has passed.
    pub fn parsed_role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut checker = Checker::new();
        if let Some(email) = &self.email {
            checker.email(email, "email");
        }
        if let Some(password) = &self.password {
            checker.min_len(password, MIN_PASSWORD_LENGTH, "password");
        }
        if let Some(first_name) = &self.first_name {
            checker.required(first_name, "first_name");
        }
        if let Some(last_name) = &self.last_name {
            checker.required(last_name, "last_name");
        }
        if let Some(role) = &self.role {
            checker.check(
                role.parse::<Role>().is_ok(),
                "role",
                "must be one of: user, admin",
            );
        }
        checker.finish()
    }
}
