use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::auth::password::{hash_password_async, verify_dummy, verify_password_async};
use crate::error::{AppError, AppResult};
use crate::users::dto::UpdateUserRequest;
use crate::users::repo::{RepoError, UserRepository};
use crate::users::repo_types::{NewUser, Role, User, UserChanges};
use crate::validation::normalize_email;

/// Signup, login and user management on top of a [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// The existence check is only an early exit; the unique index decides
    /// races, and both paths report [`AppError::EmailAlreadyExists`].
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<User> {
        let email = normalize_email(email);

        if self.repo.get_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = hash_password_async(password.to_string()).await?;

        let user = self
            .repo
            .create(NewUser {
                id: Uuid::new_v4(),
                email,
                password_hash,
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                role: Role::User,
            })
            .await
            .map_err(|e| {
                if matches!(e, RepoError::EmailTaken) {
                    warn!("signup lost a race on the unique email index");
                }
                AppError::from(e)
            })?;

        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn login_user(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);

        let Some(user) = self.repo.get_by_email(&email).await? else {
            verify_dummy(password.to_string()).await?;
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let ok = verify_password_async(password.to_string(), user.password_hash.clone()).await?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    pub async fn get_all_users(&self) -> AppResult<Vec<User>> {
        Ok(self.repo.get_all().await?)
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Users may edit themselves; admins may edit anyone. Only admins may
    /// change roles.
    #[instrument(skip(self, actor, req), fields(actor = %actor.user_id))]
    pub async fn update_user(
        &self,
        actor: &AuthUser,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> AppResult<User> {
        ensure_self_or_admin(actor, id)?;

        let role = req.parsed_role();
        if role.is_some() && actor.role != Role::Admin {
            warn!(user_id = %id, "non-admin attempted role change");
            return Err(AppError::Forbidden);
        }

        let password_hash = match req.password {
            Some(plain) => Some(hash_password_async(plain).await?),
            None => None,
        };

        let changes = UserChanges {
            email: req.email.as_deref().map(normalize_email),
            password_hash,
            first_name: req.first_name.map(|s| s.trim().to_string()),
            last_name: req.last_name.map(|s| s.trim().to_string()),
            role,
        };

        let user = self
            .repo
            .update(id, changes)
            .await?
            .ok_or(AppError::UserNotFound)?;
        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    /// Soft delete: the row stays, flagged with `deleted_at`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete_user(&self, actor: &AuthUser, id: Uuid) -> AppResult<()> {
        ensure_self_or_admin(actor, id)?;
        if !self.repo.soft_delete(id).await? {
            return Err(AppError::UserNotFound);
        }
        info!(user_id = %id, "user soft-deleted");
        Ok(())
    }
}

fn ensure_self_or_admin(actor: &AuthUser, id: Uuid) -> AppResult<()> {
    if actor.user_id == id || actor.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
