use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::users::repo_types::Role;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signing and verification keys plus token lifetimes. Built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        // Only HS256 is accepted; `exp` is checked with no leeway.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(
            cfg.secret.as_bytes(),
            minutes(cfg.access_ttl_minutes),
            minutes(cfg.refresh_ttl_minutes),
        )
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        role: Option<Role>,
        kind: TokenKind,
        ttl: Duration,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + ttl.as_secs() as usize,
            kind,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.issue(user_id, Some(role), TokenKind::Access, self.access_ttl)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue(user_id, None, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Signature, algorithm and expiry must all check out; any failure is
    /// [`AppError::TokenInvalid`].
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::TokenInvalid
        })?;
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.verify_kind(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        self.verify_kind(token, TokenKind::Refresh)
    }

    fn verify_kind(&self, token: &str, kind: TokenKind) -> AppResult<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            warn!(user_id = %claims.sub, expected = ?kind, got = ?claims.kind, "wrong token kind");
            return Err(AppError::TokenInvalid);
        }
        Ok(claims)
    }
}

fn minutes(m: i64) -> Duration {
    Duration::from_secs(u64::try_from(m).unwrap_or(0).saturating_mul(60))
}
