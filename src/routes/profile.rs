use actix_web::{web, HttpResponse};
use serde_json::{json, Value};

use super::{AppState, AuthUser};
use crate::core::evaluate;
use crate::error::ApiError;
use crate::models::notifications::{eligible_payload, NotificationType};
use crate::models::{ListingKind, Profile, ProfilePatch};

/// Configure profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/profile")
            .route(web::get().to(get_profile))
            .route(web::put().to(update_profile))
            .route(web::delete().to(delete_account)),
    );
}

/// GET /api/profile
async fn get_profile(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = state.postgres.get_profile(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}

/// PUT /api/profile
///
/// Writes only the fields present in the body, then re-evaluates the student
/// against every scholarship and notifies them of new matches.
async fn update_profile(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let fields = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("profile object required in request body"))?;
    let patch = ProfilePatch::from_json(fields)?;

    if patch.is_empty() {
        state.postgres.ensure_profile(user.id).await?;
        return Ok(HttpResponse::Ok().json(json!({ "ok": true, "message": "Profile ensured, no updates" })));
    }

    state.postgres.upsert_profile(user.id, &patch).await?;
    tracing::debug!("Updated {} profile fields for user {}", patch.fields.len(), user.id);

    if let Some(profile) = state.postgres.get_profile(user.id).await? {
        let created = notify_new_matches(&state, user.id, &profile).await?;
        if created > 0 {
            tracing::info!("User {} is newly eligible for {} scholarships", user.id, created);
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Write an `eligible` notification (and send an email) for every scholarship
/// the profile qualifies for that the user has not been told about yet
async fn notify_new_matches(state: &AppState, user_id: i64, profile: &Profile) -> Result<usize, ApiError> {
    let scholarships = state.catalog.listings(ListingKind::Scholarship).await?;
    let mut email: Option<Option<String>> = None;
    let mut created = 0;

    for listing in &scholarships {
        if !evaluate(profile, &listing.parsed_criteria()).eligible {
            continue;
        }
        if state.postgres.has_notification(user_id, listing.id).await? {
            continue;
        }

        state
            .postgres
            .create_notification(
                user_id,
                NotificationType::Eligible.as_str(),
                &eligible_payload(&listing.title),
                Some(listing.id),
            )
            .await?;
        created += 1;

        if email.is_none() {
            email = Some(state.postgres.email_for_user(user_id).await.unwrap_or_else(|e| {
                tracing::warn!("Email lookup failed for user {}: {}", user_id, e);
                None
            }));
        }
        if let Some(Some(address)) = &email {
            if let Err(e) = state.mailer.send_eligibility(address, listing).await {
                tracing::warn!("Email error: {}", e);
            }
        }
    }

    Ok(created)
}

/// DELETE /api/profile
async fn delete_account(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    state.postgres.delete_account(user.id).await?;
    tracing::info!("Deleted account {}", user.id);

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
