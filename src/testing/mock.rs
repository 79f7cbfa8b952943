// In-memory fakes for the platform collaborator traits
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::platform::{
    AuthBrowser, BiometricAuthenticator, BiometricError, BrowserResult, PlainStorage,
    SecureStorage, StorageError,
};

/// In-memory key/value store usable as both plain and secure backend
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .map(|entries| entries.get(key).cloned())
            .unwrap_or(None)
    }

    fn write(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[async_trait]
impl SecureStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.remove(key);
        Ok(())
    }
}

#[async_trait]
impl PlainStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.remove(key);
        Ok(())
    }
}

/// Biometric stub with scripted prompt outcomes.
/// When no outcome is scripted, prompts succeed.
pub struct StubBiometrics {
    hardware: bool,
    enrolled: bool,
    outcomes: Mutex<VecDeque<Result<(), BiometricError>>>,
}

impl StubBiometrics {
    /// Device with hardware and an enrolled biometric
    #[must_use]
    pub fn capable() -> Self {
        Self {
            hardware: true,
            enrolled: true,
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    /// Device without usable biometrics
    #[must_use]
    pub fn incapable() -> Self {
        Self {
            hardware: false,
            enrolled: false,
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue prompt outcomes, consumed in order
    #[must_use]
    pub fn scripted(
        self,
        outcomes: impl IntoIterator<Item = Result<(), BiometricError>>,
    ) -> Self {
        if let Ok(mut queue) = self.outcomes.lock() {
            queue.extend(outcomes);
        }
        self
    }
}

#[async_trait]
impl BiometricAuthenticator for StubBiometrics {
    async fn has_hardware(&self) -> bool {
        self.hardware
    }

    async fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    async fn authenticate(&self, _prompt: &str) -> Result<(), BiometricError> {
        if !self.hardware || !self.enrolled {
            return Err(BiometricError::Unavailable);
        }
        self.outcomes
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(Ok(()))
    }
}

/// Browser fake returning scripted results and recording opened URLs
pub struct ScriptedBrowser {
    results: Mutex<VecDeque<BrowserResult>>,
    opened: Mutex<Vec<String>>,
}

impl ScriptedBrowser {
    /// Browser that returns the given result on the next open
    #[must_use]
    pub fn returning(result: BrowserResult) -> Self {
        Self {
            results: Mutex::new(VecDeque::from([result])),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// URLs passed to `open`, in order
    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthBrowser for ScriptedBrowser {
    async fn open(&self, auth_url: &str, _return_scheme: &str) -> BrowserResult {
        if let Ok(mut urls) = self.opened.lock() {
            urls.push(auth_url.to_string());
        }
        self.results
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(BrowserResult::Cancelled)
    }
}
