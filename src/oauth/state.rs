// Authorization state round-tripped through the provider's `state`
// parameter. Encoded as base64url(JSON) so that no field value can collide
// with a delimiter; the flat `platform|redirect|state` format this replaces
// broke as soon as a redirect URI contained `|`.
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of client initiated the authorization attempt
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Mobile,
}

/// Context carried through the provider redirect, created once per
/// authorization attempt and consumed exactly once by the callback handler.
/// Never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationState {
    pub platform: Platform,
    /// Redirect URI the callback will send the token to (mobile only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_redirect_uri: Option<String>,
    /// Opaque state the caller sent along; round-tripped untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_state: Option<String>,
}

#[derive(Error, Debug)]
#[error("invalid authorization state: {0}")]
pub struct StateDecodeError(String);

impl AuthorizationState {
    /// Build the state for an incoming authorization request, detecting the
    /// platform from the client's redirect URI or its own state value.
    ///
    /// A mobile client identifies itself either by a recognized app-scheme
    /// redirect URI or by prefixing its state with `mobile|` (the wire
    /// convention of the mobile app).
    #[must_use]
    pub fn for_request(
        redirect_uri: Option<&str>,
        caller_state: Option<&str>,
        mobile_scheme_prefixes: &[String],
    ) -> Self {
        let scheme_is_mobile = redirect_uri.is_some_and(|uri| {
            mobile_scheme_prefixes
                .iter()
                .any(|prefix| uri.starts_with(prefix.as_str()))
        });
        let state_is_mobile = caller_state.is_some_and(|s| s.starts_with("mobile|"));

        let platform = if scheme_is_mobile || state_is_mobile {
            Platform::Mobile
        } else {
            Platform::Web
        };

        Self {
            platform,
            client_redirect_uri: redirect_uri
                .filter(|uri| !uri.is_empty())
                .map(ToString::to_string),
            caller_state: caller_state
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
        }
    }

    /// Encode for use as the provider `state` query parameter
    #[must_use]
    pub fn encode(&self) -> String {
        // Serialization of this struct cannot fail: all fields are strings
        let json = serde_json::to_string(self).unwrap_or_default();
        general_purpose::URL_SAFE_NO_PAD.encode(json.as_bytes())
    }

    /// Decode a `state` parameter received on the callback
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not base64url or does not decode to
    /// a valid state object
    pub fn decode(encoded: &str) -> Result<Self, StateDecodeError> {
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| StateDecodeError("not valid base64url".to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StateDecodeError(e.to_string()))
    }

    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.platform == Platform::Mobile
    }
}
