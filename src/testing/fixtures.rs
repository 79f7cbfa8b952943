//! Pre-built test objects shared across unit and integration tests
use std::sync::Arc;

use crate::client::store::{EncryptedStore, SessionStore};
use crate::models::UserProfile;
use crate::settings::AuthSettings;
use crate::testing::mock::MemoryStorage;
use crate::token::{self, SessionClaims};

pub const TEST_SIGNING_SECRET: &str = "test-signing-secret";

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings with a configured provider and a fixed signing secret
    #[must_use]
    pub fn settings() -> AuthSettings {
        let mut settings = AuthSettings::default();
        settings.provider.client_id = "test-client-id".to_string();
        settings.provider.client_secret = "test-client-secret".to_string();
        settings.token.signing_secret = TEST_SIGNING_SECRET.to_string();
        settings.application.redirect_base_url = "https://auth.test".to_string();
        settings.redirect.frontend_url = "https://app.test".to_string();
        settings
    }

    /// Standard identity claims, 7-day validity
    #[must_use]
    pub fn claims() -> SessionClaims {
        SessionClaims::issue(
            "108234".to_string(),
            "ada@example.com".to_string(),
            "Ada Lovelace".to_string(),
            Some("https://lh3.example.com/photo.jpg".to_string()),
            7,
        )
    }

    /// A well-formed session token signed with [`TEST_SIGNING_SECRET`]
    ///
    /// # Panics
    ///
    /// Panics if minting fails, which only happens on serialization bugs
    #[must_use]
    pub fn signed_token() -> String {
        token::mint(&Self::claims(), TEST_SIGNING_SECRET).expect("fixture token mints")
    }

    /// The profile [`Self::claims`] maps to
    ///
    /// # Panics
    ///
    /// Panics if the fixture claims are missing required fields
    #[must_use]
    pub fn profile() -> UserProfile {
        UserProfile::from_claims(&Self::claims()).expect("fixture claims are complete")
    }

    /// Session store over in-memory backends, sessions encrypted at rest
    #[must_use]
    pub fn session_store() -> SessionStore {
        let secure = EncryptedStore::new(Arc::new(MemoryStorage::new()), b"test-device-key");
        SessionStore::new(Arc::new(secure), Arc::new(MemoryStorage::new()))
    }
}
