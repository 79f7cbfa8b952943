#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use networth_auth::{authorize, health, oauth_callback, AuthSettings, ProviderClient};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env and initializes the logger
    let settings = AuthSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let provider = ProviderClient::new(&settings);
    if !provider.is_configured() {
        log::warn!(
            "GOOGLE_CLIENT_ID is not set; authorization requests will fail until it is configured"
        );
    }

    start_server(provider, settings).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(provider: ProviderClient, settings: AuthSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    // Configure CORS for the web frontend
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(provider.clone()))
            .app_data(web::Data::new(settings.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/google", web::get().to(authorize))
        .route("/auth/callback", web::get().to(oauth_callback))
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &AuthSettings) {
    println!("Starting networth-auth on http://{bind_address}");
    println!();
    println!("Endpoints:");
    println!("  GET  /auth/google   - Begin provider authorization");
    println!("  GET  /auth/callback - Provider callback (code exchange)");
    println!("  GET  /ping          - Health check");
    println!();
    println!("Provider callback URL to register with the identity provider:");
    println!("  {}", settings.callback_url());
    println!();
    println!("Web frontend redirect: {}", settings.redirect.frontend_url);
    println!(
        "Mobile fallback scheme: {}",
        settings.redirect.fallback_scheme
    );
}
