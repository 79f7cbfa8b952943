//! End-to-end flow tests: authorization redirect, callback error delivery,
//! and token recovery on the client side.
use actix_web::{http::StatusCode, test, web, App};

use networth_auth::client::{Destination, LoginOutcome, RecoveryEngine};
use networth_auth::oauth::{AuthorizationState, Platform};
use networth_auth::testing::TestFixtures;
use networth_auth::{authorize, oauth_callback, token, AuthSettings, ProviderClient};

async fn send(
    settings: AuthSettings,
    path: &str,
) -> actix_web::dev::ServiceResponse {
    let provider = ProviderClient::new(&settings);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(settings))
            .app_data(web::Data::new(provider))
            .route("/auth/google", web::get().to(authorize))
            .route("/auth/callback", web::get().to(oauth_callback)),
    )
    .await;
    test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await
}

#[actix_web::test]
async fn authorization_state_survives_the_provider_round_trip() {
    // The mobile client starts a login
    let response = send(
        TestFixtures::settings(),
        "/auth/google?redirect_uri=exp%3A%2F%2F192.168.1.5%3A8081%2F--%2Fauth&state=mobile%7Cnonce1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    let auth_url = url::Url::parse(&location).unwrap();
    let state_param = auth_url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    // The provider echoes the state back on the callback; an error outcome
    // must land on the exact redirect URI the client registered
    let response = send(
        TestFixtures::settings(),
        &format!("/auth/callback?error=access_denied&state={state_param}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();
    assert!(body.contains("exp://192.168.1.5:8081/--/auth?error=access_denied"));

    // And the state itself decodes losslessly
    let decoded = AuthorizationState::decode(&state_param).unwrap();
    assert_eq!(decoded.platform, Platform::Mobile);
    assert_eq!(
        decoded.client_redirect_uri.as_deref(),
        Some("exp://192.168.1.5:8081/--/auth")
    );
    assert_eq!(decoded.caller_state.as_deref(), Some("mobile|nonce1"));
}

#[actix_web::test]
async fn provider_error_is_never_a_raw_error_status() {
    let state = AuthorizationState {
        platform: Platform::Mobile,
        client_redirect_uri: None,
        caller_state: None,
    }
    .encode();

    let response = send(
        TestFixtures::settings(),
        &format!("/auth/callback?error=access_denied&state={state}"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();
    // Without a client redirect URI the fallback app scheme carries the error
    assert!(body.contains("networth://auth?error=access_denied"));
}

#[actix_web::test]
async fn misconfigured_server_rejects_authorization_with_json() {
    let response = send(AuthSettings::default(), "/auth/google").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Missing GOOGLE_CLIENT_ID");
}

#[tokio::test]
async fn minted_token_travels_the_deep_link_into_a_persisted_session() {
    // Server side: mint the token the callback would embed in the redirect
    let settings = TestFixtures::settings();
    let session_token = token::mint(&TestFixtures::claims(), &settings.token.signing_secret)
        .expect("token mints");

    // The token must verify against the server secret and decode client-side
    let verified = token::verify(&session_token, &settings.token.signing_secret).unwrap();
    let decoded = token::decode_claims(&session_token).unwrap();
    assert_eq!(verified, decoded);

    // Client side: the deep link arrives and seeds the session store
    let store = TestFixtures::session_store();
    let mut engine = RecoveryEngine::new(store.clone());
    let deep_link = format!("networth://auth?token={session_token}");

    let outcome = engine.handle_uri(&deep_link).await.expect("outcome");
    let LoginOutcome::Ready {
        profile,
        destination,
    } = outcome
    else {
        panic!("expected a ready outcome");
    };

    assert_eq!(destination, Destination::Welcome);
    assert_eq!(profile.id, decoded.user_id);
    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(profile.currency, "INR");
    assert_eq!(profile.login_method, "google");

    let session = store.read().await.expect("session persisted");
    assert_eq!(session.token, session_token);
    assert_eq!(session.profile, profile);
}

#[tokio::test]
async fn second_login_overwrites_the_first_session() {
    let store = TestFixtures::session_store();
    let mut engine = RecoveryEngine::new(store.clone());

    let first = format!("networth://auth?token={}", TestFixtures::signed_token());
    engine.handle_uri(&first).await.unwrap();

    let mut other_claims = TestFixtures::claims();
    other_claims.user_id = "999001".to_string();
    other_claims.email = "grace@example.com".to_string();
    let second_token =
        token::mint(&other_claims, networth_auth::testing::fixtures::TEST_SIGNING_SECRET).unwrap();
    let second = format!("networth://auth?token={second_token}");
    engine.handle_uri(&second).await.unwrap();

    // Last write wins
    let session = store.read().await.unwrap();
    assert_eq!(session.profile.email, "grace@example.com");
}
