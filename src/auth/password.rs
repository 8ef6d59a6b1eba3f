use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tokio::sync::OnceCell;
use tracing::error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    static ref DUMMY_HASH: OnceCell<String> = OnceCell::new();
}

/// Salted argon2id hash in PHC string form.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!("hash password: {e}")
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; errors only when `hash` is not a valid PHC string.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!("parse stored hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("hash task panicked")?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("verify task panicked")?
}

/// Verifies against a hash of a random, never-issued password so a login for
/// an unknown account pays the same argon2 cost as a wrong password.
pub async fn verify_dummy(plain: String) -> anyhow::Result<bool> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| {
            let never_issued = SaltString::generate(&mut OsRng).as_str().to_string();
            hash_password_async(never_issued)
        })
        .await?;
    verify_password_async(plain, hash.clone()).await
}

#[cfg(test)]
pub fn dummy_hash_ready() -> bool {
    DUMMY_HASH.initialized()
}
