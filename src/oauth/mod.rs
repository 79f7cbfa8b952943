//! OAuth authorization-code flow support
//!
//! State codec, platform detection, and the server-to-server provider
//! exchange used by the HTTP handlers.

pub mod provider;
pub mod state;

pub use provider::{ProviderClient, ProviderIdentity};
pub use state::{AuthorizationState, Platform};

use serde::Deserialize;
use thiserror::Error;

/// Query parameters delivered to the callback endpoint by the provider
#[derive(Deserialize, Debug)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Failures of the server-side half of the handshake
#[derive(Error, Debug)]
pub enum AuthFlowError {
    /// A required server-side setting is missing; fatal for the request
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The provider rejected the authorization code
    #[error("token exchange failed: {0}")]
    ProviderExchange(String),
    /// The provider accepted the code but profile retrieval failed
    #[error("profile fetch failed: {0}")]
    ProfileFetch(String),
}
