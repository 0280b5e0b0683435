use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{
    EncryptedFilesystemStorage, KeyringStorage, StorageBackend, StorageError,
};

/// Relative storage path for the persisted access token
const TOKEN_PATH: &str = "token.json";

/// Keyring service name
const SERVICE_NAME: &str = "craedl";

/// Craedl access tokens are valid for 28 days from issuance
pub const TOKEN_VALIDITY_DAYS: i64 = 28;

/// A stored Craedl access token
///
/// The token string itself is opaque; the server does not report its
/// expiry, so we record when it was saved locally and treat it as expired
/// 28 days later. Regenerating a token on the website invalidates the old
/// one immediately regardless of this window, which surfaces as a 401.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// The opaque bearer token string
    pub token: String,
    /// RFC 3339 timestamp of when the token was saved
    pub issued_at: String,
}

impl AccessToken {
    /// Create a new access token issued now
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued_at: Utc::now().to_rfc3339(),
        }
    }

    /// When this token stops being accepted, if `issued_at` parses
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.issued_at)
            .ok()
            .map(|t| t.with_timezone(&Utc) + Duration::days(TOKEN_VALIDITY_DAYS))
    }

    /// Whether the 28-day validity window has elapsed
    ///
    /// An unparseable `issued_at` counts as expired; the stored state is
    /// unusable either way and re-running `craedl token` fixes both.
    pub fn is_expired(&self) -> bool {
        match self.expires_at() {
            Some(expires) => expires < Utc::now(),
            None => true,
        }
    }

    /// Whether this token is still within its validity window
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

/// Select the storage backend for token persistence
///
/// Prefers the OS keyring; falls back to encrypted filesystem storage when
/// the keyring is unavailable (headless servers, CI) or when
/// `CRAEDL_DISABLE_KEYRING` is set.
pub async fn get_storage_backend() -> Result<Box<dyn StorageBackend>, StorageError> {
    if std::env::var("CRAEDL_DISABLE_KEYRING").is_ok() {
        tracing::debug!("Keyring disabled via CRAEDL_DISABLE_KEYRING");
        let storage = EncryptedFilesystemStorage::open_default().await?;
        return Ok(Box::new(storage));
    }

    // Probe the keyring with a throwaway entry; the keyring crate only
    // fails on first use, not on construction.
    let probe = tokio::task::spawn_blocking(|| {
        let entry = keyring::Entry::new(SERVICE_NAME, "craedl-probe")?;
        match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    })
    .await
    .map_err(|e| StorageError::Keyring(format!("Keyring probe task failed: {}", e)))?;

    match probe {
        Ok(()) => {
            tracing::debug!("Using OS keyring for token storage");
            Ok(Box::new(KeyringStorage::new(SERVICE_NAME)))
        }
        Err(e) => {
            tracing::debug!("Keyring unavailable ({}), using encrypted filesystem", e);
            let storage = EncryptedFilesystemStorage::open_default().await?;
            Ok(Box::new(storage))
        }
    }
}

/// Persist an access token, stamping it as issued now
pub async fn save_token(token: &str) -> Result<AccessToken, StorageError> {
    let access_token = AccessToken::new(token.trim());
    let data = serde_json::to_vec(&access_token)
        .map_err(|e| StorageError::Config(format!("Failed to serialize token: {}", e)))?;

    let storage = get_storage_backend().await?;
    storage.write(TOKEN_PATH, &data).await?;
    tracing::info!("Access token saved");
    Ok(access_token)
}

/// Load the stored access token, if any
pub async fn load_token() -> Result<Option<AccessToken>, StorageError> {
    let storage = get_storage_backend().await?;

    if !storage.exists(TOKEN_PATH) {
        return Ok(None);
    }

    let data = storage.read(TOKEN_PATH).await?;
    let access_token: AccessToken = serde_json::from_slice(&data)
        .map_err(|e| StorageError::Config(format!("Failed to parse stored token: {}", e)))?;

    Ok(Some(access_token))
}

/// Remove the stored access token
pub async fn clear_token() -> Result<(), StorageError> {
    let storage = get_storage_backend().await?;

    if storage.exists(TOKEN_PATH) {
        storage.remove(TOKEN_PATH).await?;
        tracing::info!("Access token cleared");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_valid() {
        let token = AccessToken::new("abc123");
        assert!(token.is_valid());
        assert!(!token.is_expired());
        assert_eq!(token.token, "abc123");
    }

    #[test]
    fn old_token_is_expired() {
        let token = AccessToken {
            token: "abc123".to_string(),
            issued_at: "2020-01-01T00:00:00+00:00".to_string(),
        };
        assert!(token.is_expired());
        assert!(!token.is_valid());
    }

    #[test]
    fn token_issued_27_days_ago_is_still_valid() {
        let token = AccessToken {
            token: "abc123".to_string(),
            issued_at: (Utc::now() - Duration::days(27)).to_rfc3339(),
        };
        assert!(token.is_valid());
    }

    #[test]
    fn token_issued_29_days_ago_is_expired() {
        let token = AccessToken {
            token: "abc123".to_string(),
            issued_at: (Utc::now() - Duration::days(29)).to_rfc3339(),
        };
        assert!(token.is_expired());
    }

    #[test]
    fn unparseable_issued_at_counts_as_expired() {
        let token = AccessToken {
            token: "abc123".to_string(),
            issued_at: "not a timestamp".to_string(),
        };
        assert!(token.expires_at().is_none());
        assert!(token.is_expired());
    }

    #[test]
    fn expires_at_is_28_days_after_issuance() {
        let issued = Utc::now();
        let token = AccessToken {
            token: "abc123".to_string(),
            issued_at: issued.to_rfc3339(),
        };
        let expires = token.expires_at().unwrap();
        let delta = expires - issued;
        assert_eq!(delta.num_days(), 28);
    }

    #[test]
    fn token_serializes_roundtrip() {
        let token = AccessToken::new("xyz789");
        let json = serde_json::to_string(&token).unwrap();
        let back: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token, token.token);
        assert_eq!(back.issued_at, token.issued_at);
    }
}
