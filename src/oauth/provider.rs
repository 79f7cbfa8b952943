// Server-to-server half of the handshake: authorization URL construction,
// code-for-token exchange, and identity claim retrieval.
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::oauth::AuthFlowError;
use crate::settings::AuthSettings;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Identity claims returned by the provider's userinfo endpoint
#[derive(Deserialize, Debug, Clone)]
pub struct ProviderIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Client for one configured identity provider
#[derive(Clone)]
pub struct ProviderClient {
    client_id: String,
    client_secret: String,
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
    callback_url: String,
}

impl ProviderClient {
    #[must_use]
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            client_id: settings.provider.client_id.clone(),
            client_secret: settings.provider.client_secret.clone(),
            authorization_endpoint: settings.provider.authorization_endpoint.clone(),
            token_endpoint: settings.provider.token_endpoint.clone(),
            userinfo_endpoint: settings.provider.userinfo_endpoint.clone(),
            callback_url: settings.callback_url(),
        }
    }

    /// Build the provider authorization URL for a redirect response
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::Configuration` if the client id is unset or
    /// the configured endpoint is not a valid URL
    pub fn authorization_url(
        &self,
        scope: &str,
        state: &str,
        extra_params: &std::collections::HashMap<String, String>,
    ) -> Result<String, AuthFlowError> {
        if self.client_id.is_empty() {
            return Err(AuthFlowError::Configuration(
                "Missing GOOGLE_CLIENT_ID".to_string(),
            ));
        }

        let mut url = url::Url::parse(&self.authorization_endpoint)
            .map_err(|e| AuthFlowError::Configuration(format!("bad authorization endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", scope)
            .append_pair("state", state);
        for (key, value) in extra_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url.to_string())
    }

    /// Exchange an authorization code for a provider access token
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::ProviderExchange` if the request fails or the
    /// provider response carries an error field
    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthFlowError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        log::debug!("Exchanging authorization code at {}", self.token_endpoint);
        let response = HTTP_CLIENT
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthFlowError::ProviderExchange(e.to_string()))?;

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthFlowError::ProviderExchange(format!("unreadable response: {e}")))?;

        if let Some(error) = tokens.error {
            return Err(AuthFlowError::ProviderExchange(
                tokens.error_description.unwrap_or(error),
            ));
        }

        tokens.access_token.ok_or_else(|| {
            AuthFlowError::ProviderExchange("no access token in provider response".to_string())
        })
    }

    /// Fetch identity claims with a provider access token
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::ProfileFetch` on a non-success status or an
    /// unexpected response shape
    pub async fn fetch_identity(&self, access_token: &str) -> Result<ProviderIdentity, AuthFlowError> {
        let response = HTTP_CLIENT
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthFlowError::ProfileFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthFlowError::ProfileFetch(format!(
                "userinfo request failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthFlowError::ProfileFetch(format!("unexpected profile shape: {e}")))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty()
    }
}
