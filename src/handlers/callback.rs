// Callback exchange handler: GET /auth/callback
//
// Terminates the handshake: exchanges the authorization code, mints the
// session token and hands control back to whichever platform initiated the
// flow. Every failure past this point is delivered the same way as success
// (a self-redirecting HTML page with `error=` instead of `token=`), because
// the app shell's only recovery mechanism is following a redirect.
use actix_web::{web, HttpResponse, Result};
use log::{error, info, warn};
use serde_json::json;

use crate::oauth::{AuthorizationState, OAuthCallback, Platform, ProviderClient};
use crate::settings::{AuthSettings, RedirectSettings};
use crate::token::{self, SessionClaims};
use crate::utils::responses::{append_query_param, render_redirect_page, DEFAULT_REDIRECT_STEPS};

pub async fn oauth_callback(
    query: web::Query<OAuthCallback>,
    settings: web::Data<AuthSettings>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse> {
    let callback = query.into_inner();
    let auth_state = parse_state(callback.state.as_deref());

    // Provider-side failure: funnel straight into the error redirect
    if let Some(provider_error) = callback.error {
        warn!("Provider returned error on callback: {provider_error}");
        return Ok(redirect_page_response(&error_target(
            &auth_state,
            &settings.redirect,
            &provider_error,
        )));
    }

    let Some(code) = callback.code else {
        // Neither code nor error: this request never came from the
        // handshake, so there is no app shell waiting for a redirect
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "No authorization code" })));
    };

    match complete_exchange(&provider, &settings, &code).await {
        Ok(session_token) => {
            info!("OAuth callback processed, platform={:?}", auth_state.platform);
            Ok(redirect_page_response(&success_target(
                &auth_state,
                &settings.redirect,
                &session_token,
            )))
        }
        Err(e) => {
            error!("OAuth callback failed: {e}");
            Ok(redirect_page_response(&error_target(
                &auth_state,
                &settings.redirect,
                &e.to_string(),
            )))
        }
    }
}

/// Exchange the code, fetch identity claims and mint the session token
async fn complete_exchange(
    provider: &ProviderClient,
    settings: &AuthSettings,
    code: &str,
) -> std::result::Result<String, crate::oauth::AuthFlowError> {
    let access_token = provider.exchange_code(code).await?;
    let identity = provider.fetch_identity(&access_token).await?;

    let claims = SessionClaims::issue(
        identity.id,
        identity.email,
        identity.name,
        identity.picture,
        settings.token.validity_days,
    );
    token::mint(&claims, &settings.token.signing_secret)
        .map_err(|e| crate::oauth::AuthFlowError::Configuration(e.to_string()))
}

/// Decode the round-tripped state, degrading to a plain web login when the
/// parameter is missing or unreadable
fn parse_state(state: Option<&str>) -> AuthorizationState {
    state
        .and_then(|s| match AuthorizationState::decode(s) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Unreadable state parameter on callback: {e}");
                None
            }
        })
        .unwrap_or(AuthorizationState {
            platform: Platform::Web,
            client_redirect_uri: None,
            caller_state: None,
        })
}

/// Base URI the caller gets redirected to, by platform
fn redirect_base<'a>(state: &'a AuthorizationState, redirect: &'a RedirectSettings) -> &'a str {
    if state.is_mobile() {
        state
            .client_redirect_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .unwrap_or(&redirect.fallback_scheme)
    } else {
        &redirect.frontend_url
    }
}

pub(crate) fn success_target(
    state: &AuthorizationState,
    redirect: &RedirectSettings,
    session_token: &str,
) -> String {
    append_query_param(redirect_base(state, redirect), "token", session_token)
}

pub(crate) fn error_target(
    state: &AuthorizationState,
    redirect: &RedirectSettings,
    message: &str,
) -> String {
    append_query_param(
        redirect_base(state, redirect),
        "error",
        &urlencoding::encode(message),
    )
}

fn redirect_page_response(target: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_redirect_page(target, DEFAULT_REDIRECT_STEPS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    fn settings() -> AuthSettings {
        let mut settings = AuthSettings::default();
        settings.provider.client_id = "test-client-id".to_string();
        settings.token.signing_secret = "test-signing-secret".to_string();
        settings.redirect.frontend_url = "https://app.test".to_string();
        settings
    }

    fn mobile_state(redirect_uri: Option<&str>) -> AuthorizationState {
        AuthorizationState {
            platform: Platform::Mobile,
            client_redirect_uri: redirect_uri.map(ToString::to_string),
            caller_state: None,
        }
    }

    fn web_state() -> AuthorizationState {
        AuthorizationState {
            platform: Platform::Web,
            client_redirect_uri: None,
            caller_state: None,
        }
    }

    #[::core::prelude::v1::test]
    fn mobile_target_uses_exact_client_redirect_uri() {
        let state = mobile_state(Some("exp://192.168.1.5:8081/--/auth"));
        let target = success_target(&state, &settings().redirect, "tok123");
        assert!(target.starts_with("exp://192.168.1.5:8081/--/auth"));
        assert!(target.ends_with("?token=tok123"));
    }

    #[::core::prelude::v1::test]
    fn mobile_target_falls_back_to_app_scheme() {
        let target = success_target(&mobile_state(None), &settings().redirect, "tok123");
        assert!(target.starts_with("networth://auth"));
        assert_eq!(target, "networth://auth?token=tok123");
    }

    #[::core::prelude::v1::test]
    fn web_target_uses_frontend_url() {
        let target = success_target(&web_state(), &settings().redirect, "tok123");
        assert_eq!(target, "https://app.test?token=tok123");
    }

    #[::core::prelude::v1::test]
    fn error_target_urlencodes_the_message() {
        let target = error_target(
            &mobile_state(None),
            &settings().redirect,
            "token exchange failed: bad code",
        );
        assert_eq!(
            target,
            "networth://auth?error=token%20exchange%20failed%3A%20bad%20code"
        );
    }

    #[::core::prelude::v1::test]
    fn empty_client_redirect_uri_falls_back() {
        let state = mobile_state(Some(""));
        let target = success_target(&state, &settings().redirect, "tok");
        assert!(target.starts_with("networth://auth"));
    }

    async fn send_callback(path: &str) -> actix_web::dev::ServiceResponse {
        let settings = settings();
        let provider = ProviderClient::new(&settings);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(settings))
                .app_data(web::Data::new(provider))
                .route("/auth/callback", web::get().to(oauth_callback)),
        )
        .await;
        test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await
    }

    #[actix_web::test]
    async fn provider_error_yields_200_html_with_error_redirect() {
        let state = mobile_state(Some("networth://auth")).encode();
        let response =
            send_callback(&format!("/auth/callback?error=access_denied&state={state}")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .starts_with("text/html"));

        let body = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();
        assert!(body.contains("networth://auth?error=access_denied"));
    }

    #[actix_web::test]
    async fn unreadable_state_degrades_to_web_redirect() {
        let response = send_callback("/auth/callback?error=access_denied&state=garbage").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();
        assert!(body.contains("https://app.test?error=access_denied"));
    }

    #[actix_web::test]
    async fn missing_code_and_error_is_a_bad_request() {
        let response = send_callback("/auth/callback").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "No authorization code");
    }
}
