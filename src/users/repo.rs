use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::users::repo_types::{NewUser, User, UserChanges, UserRow};

const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, \
                            is_verified, created_at, updated_at, deleted_at";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already taken")]
    EmailTaken,

    #[error("corrupt user row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::EmailTaken => AppError::EmailAlreadyExists,
            other => AppError::Internal(other.into()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage for user records. Soft-deleted users are invisible to every read.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user; a duplicate email fails with [`RepoError::EmailTaken`].
    async fn create(&self, user: NewUser) -> RepoResult<User>;
    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_all(&self) -> RepoResult<Vec<User>>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>>;
    /// Returns `false` when there was no live user with that id.
    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn decode(row: UserRow) -> RepoResult<User> {
    User::try_from(row).map_err(RepoError::Corrupt)
}

fn map_write_err(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            RepoError::EmailTaken
        }
        _ => RepoError::Database(e),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(map_write_err)?;
        decode(row)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(decode).transpose()
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(decode).transpose()
    }

    async fn get_all(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(decode).collect()
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET email         = COALESCE($2, email),
                   password_hash = COALESCE($3, password_hash),
                   first_name    = COALESCE($4, first_name),
                   last_name     = COALESCE($5, last_name),
                   role          = COALESCE($6, role),
                   updated_at    = now()
             WHERE id = $1 AND deleted_at IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_err)?;
        row.map(decode).transpose()
    }

    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
