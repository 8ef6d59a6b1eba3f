use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::{RepoError, RepoResult, UserRepository};
use crate::users::repo_types::{NewUser, User, UserChanges};

/// Vec-backed repository for tests. Enforces the same live-email uniqueness
/// as the partial unique index in Postgres.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &[User], email: &str, except: Option<Uuid>) -> bool {
    users
        .iter()
        .any(|u| u.deleted_at.is_none() && u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new: NewUser) -> RepoResult<User> {
        let mut users = self.users.lock().unwrap();
        if email_taken(&users, &new.email, None) {
            return Err(RepoError::EmailTaken);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: new.id,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            is_verified: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.deleted_at.is_none() && u.id == id)
            .cloned())
    }

    async fn get_all(&self) -> RepoResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.deleted_at.is_none()).cloned().collect())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(RepoError::EmailTaken);
            }
        }
        let Some(user) = users
            .iter_mut()
            .find(|u| u.deleted_at.is_none() && u.id == id)
        else {
            return Ok(None);
        };
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.password_hash {
            user.password_hash = v;
        }
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.role {
            user.role = v;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.deleted_at.is_none() && u.id == id)
        {
            Some(user) => {
                let now = OffsetDateTime::now_utc();
                user.deleted_at = Some(now);
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "hash".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn duplicate_email_fails_without_overwriting() {
        let repo = InMemoryUserRepository::new();
        let first = repo.create(new_user("a@b.com")).await.unwrap();
        let err = repo.create(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::EmailTaken));
        let stored = repo.get_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn soft_deleted_users_disappear_and_free_their_email() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("a@b.com")).await.unwrap();
        assert!(repo.soft_delete(user.id).await.unwrap());
        assert!(!repo.soft_delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(repo.get_all().await.unwrap().is_empty());
        repo.create(new_user("a@b.com")).await.unwrap();
    }
}
