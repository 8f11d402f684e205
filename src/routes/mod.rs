// Route exports
pub mod auth;
pub mod dashboard;
pub mod gpa;
pub mod listings;
pub mod matches;
pub mod notifications;
pub mod process;
pub mod profile;

use actix_web::middleware::DefaultHeaders;
use actix_web::{http::header, web, HttpResponse, Responder};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::HealthResponse;
use crate::services::{IdentityVerifier, ListingCatalog, Mailer, PostgresClient, ProcessExtractor, TokenService};

pub use auth::AuthUser;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub catalog: Arc<ListingCatalog>,
    pub tokens: Arc<TokenService>,
    pub identity: Arc<IdentityVerifier>,
    pub mailer: Arc<Mailer>,
    pub extractor: Arc<ProcessExtractor>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .configure(auth::configure)
            .configure(profile::configure)
            .configure(process::configure)
            .configure(listings::configure)
            .configure(matches::configure)
            .configure(notifications::configure)
            .configure(dashboard::configure)
            .configure(gpa::configure)
            .default_service(web::to(not_found)),
    );
}

/// Headers added to every response
pub fn default_headers() -> DefaultHeaders {
    DefaultHeaders::new().add((header::CACHE_CONTROL, "no-store"))
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database = state.postgres.health_check().await.unwrap_or(false);
    let status = if database { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        status: status.to_string(),
        database,
        cache: state.catalog.cache().backend().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::not_found("Not found"))
}
