use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use serde_json::json;
use std::future::{ready, Ready};
use validator::Validate;

use super::AppState;
use crate::error::ApiError;
use crate::models::{GoogleLoginRequest, GoogleLoginResponse, LoginRequest, RegisterRequest, TokenResponse};

/// Signed-in user, taken from the `Authorization: Bearer <token>` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::internal("Server error", "application state is not registered"))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("no auth"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.split_whitespace().nth(1))
        .ok_or_else(|| ApiError::unauthorized("invalid token"))?;

    let claims = state.tokens.verify(token)?;
    Ok(AuthUser { id: claims.id })
}

/// Configure authentication routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/google-login", web::post().to(google_login)),
    );
}

/// POST /api/auth/register
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let email = req.email.to_lowercase();
    let hash = state.tokens.hash_password(&req.password).await?;
    let user_id = state.postgres.create_password_user(&email, &hash).await?;

    tracing::info!("Registered user {}", user_id);
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// POST /api/auth/login
async fn login(state: web::Data<AppState>, req: web::Json<LoginRequest>) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let user = state
        .postgres
        .find_user_by_email(&req.email.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Please sign in with Google"))?;

    if !state.tokens.verify_password(&req.password, hash).await? {
        tracing::debug!("Rejected password for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.tokens.issue(user.id)?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/auth/google-login
///
/// Verifies a Firebase ID token, then finds or creates the matching account.
/// An existing password account is linked to the Google identity.
async fn google_login(
    state: web::Data<AppState>,
    req: web::Json<GoogleLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let id_token = req
        .id_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("ID token is required"))?;

    let identity = state.identity.verify(id_token).await?;
    let email = identity
        .email
        .clone()
        .ok_or_else(|| ApiError::bad_request("Email not found in Google account"))?;
    let normalized = email.to_lowercase();

    let user_id = match state.postgres.find_user_by_email(&normalized).await? {
        Some(user) => {
            if user.google_id.is_none() {
                state.postgres.link_google_account(user.id, &identity.uid).await?;
            }
            user.id
        }
        None => {
            let id = state
                .postgres
                .create_google_user(&normalized, &identity.uid, identity.name.as_deref())
                .await?;
            tracing::info!("Created user {} from Google sign-in", id);
            id
        }
    };

    let token = state.tokens.issue(user_id)?;
    Ok(HttpResponse::Ok().json(GoogleLoginResponse { token, user_id, email }))
}
