// Re-entry decision: what the user sees when the app starts.
use std::sync::Arc;

use log::{debug, info, warn};

use crate::client::platform::{BiometricAuthenticator, BiometricError};
use crate::client::store::{SessionStore, StoreError};

/// Screens the state machine can resolve to on app start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Login,
    BiometricPrompt,
    Welcome,
    Main,
}

/// Decides app entry from session presence, biometric enrollment and the
/// first-login flag. Evaluated once per app start.
pub struct ReentryMachine {
    store: SessionStore,
    biometrics: Arc<dyn BiometricAuthenticator>,
}

impl ReentryMachine {
    #[must_use]
    pub fn new(store: SessionStore, biometrics: Arc<dyn BiometricAuthenticator>) -> Self {
        Self { store, biometrics }
    }

    /// Resolve the initial entry point.
    ///
    /// A biometric preference only gates entry while the device can
    /// actually honor it; without hardware or enrollment the user is let
    /// through rather than locked out.
    pub async fn initial_entry(&self) -> EntryPoint {
        if self.store.read().await.is_none() {
            debug!("No stored session, starting at login");
            return EntryPoint::Login;
        }

        if self.store.is_biometric_enabled().await {
            if self.biometrics.is_available().await {
                return EntryPoint::BiometricPrompt;
            }
            warn!("Biometric preference set but device cannot honor it, degrading");
        }

        if self.store.is_first_login_done().await {
            EntryPoint::Main
        } else {
            EntryPoint::Welcome
        }
    }

    /// Run the biometric prompt. Success unlocks `Main` (biometric-gated
    /// users have necessarily completed the welcome flow before); failure
    /// or cancellation leaves the machine at the prompt, re-triggerable.
    ///
    /// # Errors
    ///
    /// Returns an error when the device cannot authenticate, no session is
    /// stored, or the user fails the prompt
    pub async fn attempt_biometric(&self, prompt: &str) -> Result<EntryPoint, BiometricError> {
        if !self.biometrics.is_available().await {
            return Err(BiometricError::Unavailable);
        }

        self.biometrics.authenticate(prompt).await?;

        if self.store.read().await.is_none() {
            // Session disappeared between app start and the prompt
            return Err(BiometricError::Failed(
                "no stored session, sign in again".to_string(),
            ));
        }

        info!("Biometric authentication succeeded");
        Ok(EntryPoint::Main)
    }

    /// Clear the session and both flags, landing back at login
    ///
    /// # Errors
    ///
    /// Returns an error if clearing the store fails
    pub async fn logout(&self) -> Result<EntryPoint, StoreError> {
        self.store.clear().await?;
        info!("Logged out, session cleared");
        Ok(EntryPoint::Login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock::StubBiometrics;
    use crate::testing::TestFixtures;

    async fn machine_with(
        session: bool,
        biometric_enabled: bool,
        first_login_done: bool,
        biometrics: StubBiometrics,
    ) -> ReentryMachine {
        let store = TestFixtures::session_store();
        if session {
            store
                .store(&TestFixtures::profile(), &TestFixtures::signed_token())
                .await
                .unwrap();
        }
        if biometric_enabled {
            store.set_biometric_enabled(true).await.unwrap();
        }
        if first_login_done {
            store.set_first_login_done().await.unwrap();
        }
        ReentryMachine::new(store, Arc::new(biometrics))
    }

    #[tokio::test]
    async fn no_session_starts_at_login() {
        let machine = machine_with(false, false, false, StubBiometrics::capable()).await;
        assert_eq!(machine.initial_entry().await, EntryPoint::Login);
    }

    #[tokio::test]
    async fn fresh_session_without_biometrics_starts_at_welcome() {
        let machine = machine_with(true, false, false, StubBiometrics::capable()).await;
        assert_eq!(machine.initial_entry().await, EntryPoint::Welcome);
    }

    #[tokio::test]
    async fn returning_session_without_biometrics_starts_at_main() {
        let machine = machine_with(true, false, true, StubBiometrics::capable()).await;
        assert_eq!(machine.initial_entry().await, EntryPoint::Main);
    }

    #[tokio::test]
    async fn biometric_preference_gates_entry_when_device_is_capable() {
        let machine = machine_with(true, true, true, StubBiometrics::capable()).await;
        assert_eq!(machine.initial_entry().await, EntryPoint::BiometricPrompt);
    }

    #[tokio::test]
    async fn biometric_preference_degrades_when_device_cannot_honor_it() {
        let machine = machine_with(true, true, true, StubBiometrics::incapable()).await;
        assert_eq!(machine.initial_entry().await, EntryPoint::Main);

        let machine = machine_with(true, true, false, StubBiometrics::incapable()).await;
        assert_eq!(machine.initial_entry().await, EntryPoint::Welcome);
    }

    #[tokio::test]
    async fn successful_biometric_unlocks_main() {
        let machine = machine_with(true, true, true, StubBiometrics::capable()).await;
        let entry = machine.attempt_biometric("Unlock your data").await.unwrap();
        assert_eq!(entry, EntryPoint::Main);
    }

    #[tokio::test]
    async fn failed_biometric_surfaces_and_is_retriggerable() {
        let biometrics = StubBiometrics::capable()
            .scripted([Err(BiometricError::Failed("not recognized".to_string())), Ok(())]);
        let machine = machine_with(true, true, true, biometrics).await;

        assert!(machine.attempt_biometric("Unlock").await.is_err());
        // Second attempt succeeds
        assert_eq!(
            machine.attempt_biometric("Unlock").await.unwrap(),
            EntryPoint::Main
        );
    }

    #[tokio::test]
    async fn biometric_attempt_without_capability_is_unavailable() {
        let machine = machine_with(true, true, true, StubBiometrics::incapable()).await;
        assert_eq!(
            machine.attempt_biometric("Unlock").await.unwrap_err(),
            BiometricError::Unavailable
        );
    }

    #[tokio::test]
    async fn biometric_success_without_session_reports_failure() {
        let machine = machine_with(false, true, true, StubBiometrics::capable()).await;
        assert!(matches!(
            machine.attempt_biometric("Unlock").await,
            Err(BiometricError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn logout_clears_everything_and_lands_on_login() {
        let machine = machine_with(true, true, true, StubBiometrics::capable()).await;
        assert_eq!(machine.logout().await.unwrap(), EntryPoint::Login);
        assert_eq!(machine.initial_entry().await, EntryPoint::Login);
    }
}
