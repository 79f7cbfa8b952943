use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::SessionClaims;

/// Currency assigned to profiles created from a provider login
pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// User profile as the client app persists and displays it.
/// Wire field names match the stored JSON the mobile screens read.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: Option<String>,
    pub currency: String,
    #[serde(rename = "loginMethod")]
    pub login_method: String,
}

#[derive(Error, Debug)]
#[error("missing required profile fields: {0}")]
pub struct MissingProfileFields(String);

impl UserProfile {
    /// Map decoded session claims to a profile.
    ///
    /// # Errors
    ///
    /// Returns an error when a required identity field (`id`, `name`,
    /// `email`) is empty — a token without them cannot seed a session
    pub fn from_claims(claims: &SessionClaims) -> Result<Self, MissingProfileFields> {
        let mut missing = Vec::new();
        if claims.user_id.is_empty() {
            missing.push("id");
        }
        if claims.name.is_empty() {
            missing.push("name");
        }
        if claims.email.is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(MissingProfileFields(missing.join(", ")));
        }

        Ok(Self {
            id: claims.user_id.clone(),
            name: claims.name.clone(),
            email: claims.email.clone(),
            profile_picture: claims.picture.clone(),
            currency: DEFAULT_CURRENCY.to_string(),
            login_method: "google".to_string(),
        })
    }
}

/// A complete client-side session: profile and token together.
/// One without the other is treated as no session at all.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserSession {
    pub profile: UserProfile,
    pub token: String,
}
