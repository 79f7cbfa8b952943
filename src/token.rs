// Session token codec: HS256-signed, expiring identity claims.
// Construction and parsing only; transport is the callers' concern.
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Identity claims carried by the session token.
///
/// Field names on the wire match what the mobile client decodes
/// (`userId`, `email`, `name`, `picture`, `iat`, `exp`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Create claims valid from now for the given number of days
    #[must_use]
    pub fn issue(
        user_id: String,
        email: String,
        name: String,
        picture: Option<String>,
        validity_days: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::days(i64::try_from(validity_days).unwrap_or(7));
        Self {
            user_id,
            email,
            name,
            picture,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Mint a signed session token from the given claims
///
/// # Errors
///
/// Returns an error if claims serialization fails
pub fn mint(claims: &SessionClaims, secret: &str) -> Result<String, TokenError> {
    let header = json!({
        "alg": "HS256",
        "typ": "JWT"
    });

    let header_json = serde_json::to_string(&header)
        .map_err(|e| TokenError::Malformed(format!("header serialization failed: {e}")))?;
    let claims_json = serde_json::to_string(claims)
        .map_err(|e| TokenError::Malformed(format!("claims serialization failed: {e}")))?;

    let header_b64 = general_purpose::URL_SAFE_NO_PAD.encode(header_json.as_bytes());
    let claims_b64 = general_purpose::URL_SAFE_NO_PAD.encode(claims_json.as_bytes());

    let message = format!("{header_b64}.{claims_b64}");
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(sign(secret, message.as_bytes()));

    Ok(format!("{message}.{signature_b64}"))
}

/// Decode the claims segment without verifying the signature.
///
/// This is the client-side projection: the app only needs the claims for
/// display and session bootstrap, and does not hold the signing secret.
/// Accepts base64url and falls back to standard base64, since some browser
/// shells re-encode the token in transit.
///
/// # Errors
///
/// Returns `TokenError::Malformed` if the token does not have three
/// dot-separated segments, the claims segment is not valid base64, or the
/// decoded claims are not valid JSON
pub fn decode_claims(token: &str) -> Result<SessionClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, got {}",
            parts.len()
        )));
    }

    let claims_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .or_else(|_| general_purpose::STANDARD.decode(parts[1]))
        .map_err(|_| TokenError::Malformed("claims segment is not valid base64".to_string()))?;

    serde_json::from_slice(&claims_bytes)
        .map_err(|e| TokenError::Malformed(format!("claims are not valid JSON: {e}")))
}

/// Verify the signature and expiry of a token, returning its claims
///
/// # Errors
///
/// Returns an error if the token is malformed, the signature does not match
/// the signing secret, or the claims have expired
pub fn verify(token: &str, secret: &str) -> Result<SessionClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, got {}",
            parts.len()
        )));
    }

    let message = format!("{}.{}", parts[0], parts[1]);
    let expected = sign(secret, message.as_bytes());
    let received = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| TokenError::Malformed("signature segment is not valid base64".to_string()))?;

    if expected != received {
        return Err(TokenError::InvalidSignature);
    }

    let claims = decode_claims(token)?;
    if claims.is_expired() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn sign(secret: &str, message: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
