// Authorization redirect builder: GET /auth/google
use actix_web::{web, HttpResponse, Result};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;

use crate::oauth::{AuthorizationState, ProviderClient};
use crate::settings::AuthSettings;

#[derive(Deserialize, Debug)]
pub struct AuthorizeQuery {
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub scope: Option<String>,
}

/// Build the provider authorization URL and redirect the caller to it.
///
/// The client's redirect URI and state are folded into the provider `state`
/// parameter; the provider itself always calls back to this server, so the
/// code exchange happens server-side.
///
/// # Errors
///
/// Never returns `Err`; misconfiguration is reported as a 500 JSON body
pub async fn authorize(
    query: web::Query<AuthorizeQuery>,
    settings: web::Data<AuthSettings>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse> {
    if !provider.is_configured() {
        error!("Authorization request received but GOOGLE_CLIENT_ID is not set");
        return Ok(HttpResponse::InternalServerError()
            .json(json!({ "error": "Missing GOOGLE_CLIENT_ID" })));
    }

    let auth_state = AuthorizationState::for_request(
        query.redirect_uri.as_deref(),
        query.state.as_deref(),
        &settings.redirect.mobile_scheme_prefixes,
    );
    let scope = settings.provider.resolve_scope(query.scope.as_deref());

    info!(
        "OAuth init: platform={:?} client_redirect={:?}",
        auth_state.platform, auth_state.client_redirect_uri
    );

    match provider.authorization_url(&scope, &auth_state.encode(), &settings.provider.extra_auth_params)
    {
        Ok(auth_url) => Ok(HttpResponse::Found()
            .append_header(("Location", auth_url))
            .finish()),
        Err(e) => {
            error!("Failed to build authorization URL: {e}");
            Ok(HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })))
        }
    }
}
