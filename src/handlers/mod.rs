// HTTP request handlers for the authentication endpoints
pub mod authorize;
pub mod callback;

pub use authorize::authorize;
pub use callback::oauth_callback;

use actix_web::HttpResponse;

use crate::models::HealthResponse;

/// Health check endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: "networth-auth is running".to_string(),
    })
}
