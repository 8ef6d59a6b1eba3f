use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{AppError, FieldErrors};

const MAX_EMAIL_LENGTH: usize = 254;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_RE.is_match(email)
}

/// Trim + lowercase, the stored form of every email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Collects per-field messages; the first message for a field wins.
#[derive(Debug, Default)]
pub struct Checker {
    errors: FieldErrors,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
        self
    }

    pub fn required(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "is required")
    }

    /// Like [`Checker::required`] but whitespace counts, for secrets.
    pub fn present(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.is_empty(), field, "is required")
    }

    pub fn email(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(
            is_valid_email(&normalize_email(value)),
            field,
            "must be a valid email address",
        )
    }

    pub fn min_len(&mut self, value: &str, min: usize, field: &str) -> &mut Self {
        if value.chars().count() < min {
            let message = format!("must be at least {min} characters");
            self.check(false, field, &message);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// JSON body that has been parsed and passed [`Validate`]. Unparseable bodies
/// become `400 BadRequest`, failed field checks `400 Validation`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                warn!(error = %e.body_text(), "rejected request body");
                AppError::BadRequest("invalid request body".into())
            })?;
        value.validate().map_err(|fields| {
            warn!(fields = ?fields.keys().collect::<Vec<_>>(), "validation failed");
            AppError::Validation(fields)
        })?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("ab.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email(&format!("{}@b.com", "a".repeat(260))));
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@B.Com \n"), "a@b.com");
    }

    #[test]
    fn checker_keeps_first_message_per_field() {
        let errs = Checker::new()
            .required("", "password")
            .min_len("", 8, "password")
            .email("nope", "email")
            .finish()
            .unwrap_err();
        assert_eq!(errs["password"], "is required");
        assert_eq!(errs["email"], "must be a valid email address");
        assert!(Checker::new().required("x", "name").finish().is_ok());
    }

    #[test]
    fn present_keeps_whitespace() {
        let errs = Checker::new()
            .required("   ", "name")
            .present("   ", "password")
            .present("", "secret")
            .finish()
            .unwrap_err();
        assert_eq!(errs["name"], "is required");
        assert!(!errs.contains_key("password"));
        assert_eq!(errs["secret"], "is required");
    }
}
