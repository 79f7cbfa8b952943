// Platform collaborator traits. The client core never talks to the OS
// directly; each capability is injected so the core stays testable without
// a device.
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("storage backend error: {0}")]
pub struct StorageError(pub String);

/// Encrypted-at-rest key/value storage (OS keychain/keystore, or the
/// [`EncryptedStore`](crate::client::EncryptedStore) wrapper over a plain
/// backend)
#[async_trait]
pub trait SecureStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Plain key/value storage for non-sensitive flags
#[async_trait]
pub trait PlainStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BiometricError {
    #[error("biometric authentication not available on this device")]
    Unavailable,
    #[error("biometric authentication failed: {0}")]
    Failed(String),
}

/// Device biometric capability
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    async fn has_hardware(&self) -> bool;
    async fn is_enrolled(&self) -> bool;

    /// Prompt the user; suspends until OS-level interaction completes
    ///
    /// # Errors
    ///
    /// Returns `BiometricError::Failed` when the user cancels or the
    /// OS rejects the attempt
    async fn authenticate(&self, prompt: &str) -> Result<(), BiometricError>;

    /// Available means the device both has hardware and has something
    /// enrolled on it
    async fn is_available(&self) -> bool {
        self.has_hardware().await && self.is_enrolled().await
    }
}

/// Outcome of an external browser auth session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserResult {
    /// User explicitly backed out of the browser
    Cancelled,
    /// Browser closed without reporting a result URL; a deep link may still
    /// arrive out of band
    Dismissed,
    /// Browser observed the redirect to the expected return scheme
    Success(String),
}

/// External browser/auth-session launcher
#[async_trait]
pub trait AuthBrowser: Send + Sync {
    async fn open(&self, auth_url: &str, return_scheme: &str) -> BrowserResult;
}
