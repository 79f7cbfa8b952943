// Deep-link recovery engine: turns an inbound post-auth redirect into a
// persisted session, with a bounded wait for callbacks that may never come.
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::client::deeplink::extract_params;
use crate::client::platform::{AuthBrowser, BrowserResult};
use crate::client::store::{SessionStore, StoreError};
use crate::models::UserProfile;
use crate::token;
use crate::utils::crypto::generate_nonce;

/// How long to wait for a deep link after the browser is dismissed without
/// reporting a result
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(8);

/// Where the app should land after a successful login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// First login on this install: show the welcome flow
    Welcome,
    /// Returning user
    Main,
}

#[derive(Error, Debug)]
pub enum RecoveryError {
    /// Token did not have three segments, or its claims were unreadable
    #[error("authentication token was malformed")]
    MalformedToken,
    /// The browser went away and no deep link arrived within the bounded
    /// wait; the user may simply retry
    #[error("no callback received from the browser")]
    NoCallbackReceived,
    /// The provider (or the callback server) reported an explicit error
    #[error("{0}")]
    ProviderError(String),
    #[error("failed to persist session: {0}")]
    Storage(#[from] StoreError),
}

/// Terminal outcome of one login attempt
#[derive(Debug)]
pub enum LoginOutcome {
    Ready {
        profile: UserProfile,
        destination: Destination,
    },
    Failed(RecoveryError),
    /// User backed out, or the flow ended without any result; not an error
    Cancelled,
}

/// Client-side engine receiving post-auth redirects.
///
/// Single-instance per app session; the in-flight guard means at most one
/// decode/persist sequence runs at a time, and a second token-carrying
/// event simply overwrites the session (last write wins).
pub struct RecoveryEngine {
    store: SessionStore,
    callback_timeout: Duration,
    in_flight: bool,
}

impl RecoveryEngine {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            in_flight: false,
        }
    }

    #[must_use]
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Build the URL the external browser opens to start a mobile login
    #[must_use]
    pub fn login_url(backend_url: &str, redirect_uri: &str, scope: &str) -> String {
        let caller_state = format!("mobile|{}", generate_nonce(6));
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", &caller_state)
            .append_pair("scope", scope)
            .finish();
        format!("{}/auth/google?{query}", backend_url.trim_end_matches('/'))
    }

    /// Process one inbound redirect URI.
    ///
    /// Returns `None` when the event carried nothing usable or was a
    /// duplicate suppressed by the in-flight guard.
    pub async fn handle_uri(&mut self, uri: &str) -> Option<LoginOutcome> {
        debug!("Deep link received: {uri}");

        let Some(params) = extract_params(uri) else {
            debug!("Deep link carried neither token nor error");
            return None;
        };

        // A token-carrying event is always processed: it may be the
        // authoritative callback superseding an earlier dismiss
        if self.in_flight && !params.has_token() {
            debug!("Login already in flight, ignoring duplicate event");
            return None;
        }

        if let Some(session_token) = params.token {
            self.in_flight = true;
            let outcome = self.complete_login(&session_token).await;
            self.in_flight = false;
            return Some(outcome);
        }

        params.error.map(|message| {
            warn!("Authentication error delivered via deep link: {message}");
            LoginOutcome::Failed(RecoveryError::ProviderError(message))
        })
    }

    /// Wait for deep-link events after the browser was dismissed.
    ///
    /// The timer is cancelled by the first event, whatever it carries;
    /// expiry without any event is `NoCallbackReceived`.
    pub async fn await_callback(&mut self, events: &mut mpsc::Receiver<String>) -> LoginOutcome {
        match tokio::time::timeout(self.callback_timeout, events.recv()).await {
            Err(_) => {
                warn!("No deep link arrived within {:?}", self.callback_timeout);
                LoginOutcome::Failed(RecoveryError::NoCallbackReceived)
            }
            Ok(None) => LoginOutcome::Cancelled,
            Ok(Some(uri)) => match self.handle_uri(&uri).await {
                Some(outcome) => outcome,
                // Event without token or error ends the attempt quietly
                None => LoginOutcome::Cancelled,
            },
        }
    }

    /// Run a complete login attempt through the external browser
    pub async fn run_login(
        &mut self,
        browser: &dyn AuthBrowser,
        auth_url: &str,
        return_scheme: &str,
        events: &mut mpsc::Receiver<String>,
    ) -> LoginOutcome {
        info!("Opening external browser for login");
        match browser.open(auth_url, return_scheme).await {
            BrowserResult::Cancelled => {
                info!("User cancelled login");
                LoginOutcome::Cancelled
            }
            BrowserResult::Success(result_url) => match self.handle_uri(&result_url).await {
                Some(outcome) => outcome,
                None => LoginOutcome::Cancelled,
            },
            BrowserResult::Dismissed => {
                debug!("Browser dismissed, waiting for deep link callback");
                self.await_callback(events).await
            }
        }
    }

    /// Decode the token's claims, persist the session and decide where the
    /// app lands. The store is only touched after a fully successful
    /// decode.
    async fn complete_login(&mut self, session_token: &str) -> LoginOutcome {
        let claims = match token::decode_claims(session_token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Token decode failed: {e}");
                return LoginOutcome::Failed(RecoveryError::MalformedToken);
            }
        };

        let profile = match UserProfile::from_claims(&claims) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Token claims unusable as a profile: {e}");
                return LoginOutcome::Failed(RecoveryError::MalformedToken);
            }
        };

        if let Err(e) = self.store.store(&profile, session_token).await {
            return LoginOutcome::Failed(RecoveryError::Storage(e));
        }

        let destination = if self.store.is_first_login_done().await {
            Destination::Main
        } else {
            Destination::Welcome
        };
        info!("Login complete for {}, destination {destination:?}", profile.id);

        LoginOutcome::Ready {
            profile,
            destination,
        }
    }
}
