// Client session persistence: encrypted session entries plus plain-storage
// flags for biometric preference and first-login state.
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::client::platform::{PlainStorage, SecureStorage, StorageError};
use crate::models::{UserProfile, UserSession};
use crate::utils::crypto::{decrypt_data, derive_encryption_key, encrypt_data, ENCRYPTION_KEY_SIZE};

pub const USER_DATA_KEY: &str = "user_data";
pub const USER_TOKEN_KEY: &str = "user_token";
const BIOMETRIC_ENABLED_KEY: &str = "biometric_enabled";
const FIRST_LOGIN_KEY: &str = "first_login";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("session serialization failed: {0}")]
    Serialization(String),
}

/// Session store over injected storage backends.
///
/// Invariant: a session is only ever reported when both the profile and the
/// token entry are present; a half-written pair reads as no session.
#[derive(Clone)]
pub struct SessionStore {
    secure: Arc<dyn SecureStorage>,
    plain: Arc<dyn PlainStorage>,
}

impl SessionStore {
    #[must_use]
    pub fn new(secure: Arc<dyn SecureStorage>, plain: Arc<dyn PlainStorage>) -> Self {
        Self { secure, plain }
    }

    /// Persist a complete session
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails
    pub async fn store(&self, profile: &UserProfile, token: &str) -> Result<(), StoreError> {
        let profile_json = serde_json::to_string(profile)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.secure.set(USER_DATA_KEY, &profile_json).await?;
        self.secure.set(USER_TOKEN_KEY, token).await?;
        debug!("Session persisted for user {}", profile.id);
        Ok(())
    }

    /// Read the stored session, or `None` when absent or unreadable
    pub async fn read(&self) -> Option<UserSession> {
        let profile_json = self.read_entry(USER_DATA_KEY).await?;
        let token = self.read_entry(USER_TOKEN_KEY).await?;

        match serde_json::from_str::<UserProfile>(&profile_json) {
            Ok(profile) => Some(UserSession { profile, token }),
            Err(e) => {
                warn!("Stored profile is unreadable, treating as no session: {e}");
                None
            }
        }
    }

    async fn read_entry(&self, key: &str) -> Option<String> {
        match self.secure.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Secure storage read for {key} failed: {e}");
                None
            }
        }
    }

    /// Rewrite the profile entry only; the token is left untouched
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub async fn update_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let profile_json = serde_json::to_string(profile)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.secure.set(USER_DATA_KEY, &profile_json).await?;
        Ok(())
    }

    /// Remove the session entries and both flags.
    ///
    /// Deletes run sequentially; a failure surfaces but already-deleted
    /// entries stay deleted. Deleting an absent entry is a no-op, so the
    /// whole operation is idempotent.
    ///
    /// # Errors
    ///
    /// Returns the first delete failure encountered
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.secure.delete(USER_DATA_KEY).await?;
        self.secure.delete(USER_TOKEN_KEY).await?;
        self.plain.delete(BIOMETRIC_ENABLED_KEY).await?;
        self.plain.delete(FIRST_LOGIN_KEY).await?;
        debug!("Session store cleared");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the flag write fails
    pub async fn set_biometric_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.plain
            .set(BIOMETRIC_ENABLED_KEY, if enabled { "true" } else { "false" })
            .await?;
        Ok(())
    }

    pub async fn is_biometric_enabled(&self) -> bool {
        self.read_flag(BIOMETRIC_ENABLED_KEY).await
    }

    /// Mark the welcome flow as completed; never cleared except by
    /// [`clear`](Self::clear)
    ///
    /// # Errors
    ///
    /// Returns an error if the flag write fails
    pub async fn set_first_login_done(&self) -> Result<(), StoreError> {
        self.plain.set(FIRST_LOGIN_KEY, "true").await?;
        Ok(())
    }

    pub async fn is_first_login_done(&self) -> bool {
        self.read_flag(FIRST_LOGIN_KEY).await
    }

    async fn read_flag(&self, key: &str) -> bool {
        match self.plain.get(key).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!("Flag read for {key} failed, defaulting to false: {e}");
                false
            }
        }
    }
}

/// AES-256-GCM wrapper giving any plain backend the encrypted-at-rest
/// guarantee expected of [`SecureStorage`]
pub struct EncryptedStore {
    backend: Arc<dyn PlainStorage>,
    key: [u8; ENCRYPTION_KEY_SIZE],
}

impl EncryptedStore {
    #[must_use]
    pub fn new(backend: Arc<dyn PlainStorage>, key_material: &[u8]) -> Self {
        Self {
            backend,
            key: derive_encryption_key(key_material),
        }
    }
}

#[async_trait::async_trait]
impl SecureStorage for EncryptedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(ciphertext) = self.backend.get(key).await? else {
            return Ok(None);
        };
        let plaintext: String = decrypt_data(&ciphertext, &self.key)
            .map_err(|e| StorageError(format!("decryption failed for {key}: {e}")))?;
        Ok(Some(plaintext))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let ciphertext = encrypt_data(&value.to_string(), &self.key)
            .map_err(|e| StorageError(format!("encryption failed for {key}: {e}")))?;
        self.backend.set(key, &ciphertext).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key).await
    }
}
