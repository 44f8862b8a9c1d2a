//! Helpers shared between the SQL model implementations.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};

use crate::error::ModelError;

/// Upper bound on snippets returned by `latest`.
pub const LATEST_LIMIT: i64 = 10;

/// Convert stored Unix seconds back into a timestamp.
pub fn timestamp(secs: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| sqlx::Error::Decode(format!("timestamp out of range: {secs}").into()))
}

/// Unix seconds for `now` and `now + days`.
pub fn created_and_expires(days: i32) -> Result<(i64, i64), ModelError> {
    let now = Utc::now();
    let expires = Duration::try_days(i64::from(days))
        .and_then(|d| now.checked_add_signed(d))
        .ok_or(ModelError::ExpiryOutOfRange(days))?;
    Ok((now.timestamp(), expires.timestamp()))
}

/// Hash `password` with Argon2id and a random salt.
///
/// Runs on the blocking pool: the default parameters (19 MiB, two
/// passes) take tens of milliseconds per hash.
pub async fn hash_password(password: &str) -> Result<String, ModelError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ModelError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| ModelError::PasswordHash(e.to_string()))?
}

/// Check `password` against a stored PHC hash string.
pub async fn verify_password(password: &str, stored: String) -> Result<bool, ModelError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored).map_err(|e| ModelError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| ModelError::PasswordHash(e.to_string()))?
}

/// True if `err` is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_round_trip() {
        let hash = hash_password("pa55word").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("pa55word"));
        assert!(verify_password("pa55word", hash.clone()).await.unwrap());
        assert!(!verify_password("wrong", hash).await.unwrap());
    }

    #[test]
    fn expiry_is_days_after_creation() {
        let (created, expires) = created_and_expires(7).unwrap();
        assert_eq!(expires - created, 7 * 86_400);
        assert_eq!(timestamp(created).unwrap().timestamp(), created);
    }

    #[test]
    fn huge_expiry_is_an_error() {
        assert!(matches!(
            created_and_expires(i32::MAX),
            Err(ModelError::ExpiryOutOfRange(i32::MAX))
        ));
        assert!(created_and_expires(-1).is_ok());
    }

    #[test]
    fn corrupt_timestamp_is_an_error() {
        assert!(timestamp(0).is_ok());
        assert!(matches!(timestamp(i64::MAX), Err(sqlx::Error::Decode(_))));
    }
}
