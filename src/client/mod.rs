//! Client-side authentication core
//!
//! Everything the mobile app needs between "user tapped Sign in" and "the
//! rest of the app takes over": deep-link token recovery, encrypted session
//! persistence, and the biometric-gated re-entry decision. Platform
//! facilities (secure storage, biometrics, the external auth browser) are
//! injected through the traits in [`platform`], so the whole module runs
//! against in-memory fakes in tests.

pub mod deeplink;
pub mod platform;
pub mod recovery;
pub mod reentry;
pub mod store;

pub use deeplink::{extract_params, CallbackParams};
pub use platform::{
    AuthBrowser, BiometricAuthenticator, BiometricError, BrowserResult, PlainStorage,
    SecureStorage, StorageError,
};
pub use recovery::{Destination, LoginOutcome, RecoveryEngine, RecoveryError};
pub use reentry::{EntryPoint, ReentryMachine};
pub use store::{EncryptedStore, SessionStore, StoreError};
