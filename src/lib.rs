#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the networth-auth crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod client;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod settings;
pub mod token;
pub mod utils;

// Test utilities for unit tests and (behind the feature) integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use client::{RecoveryEngine, ReentryMachine, SessionStore};
pub use handlers::{authorize, health, oauth_callback};
pub use models::{UserProfile, UserSession};
pub use oauth::ProviderClient;
pub use settings::AuthSettings;
