use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::ListingKind;

/// Configure application-process routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/scholarships/{id}/fetch-process", web::post().to(fetch_process));
}

/// POST /api/scholarships/{id}/fetch-process
///
/// Extracts application steps from the scholarship's application page and
/// stores them on the scholarship.
async fn fetch_process(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let scholarship = state
        .postgres
        .get_listing(ListingKind::Scholarship, id)
        .await?
        .ok_or_else(|| ApiError::not_found("scholarship not found"))?;

    let url = scholarship
        .application_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("no application_url for this scholarship"))?;

    tracing::info!("User {} requested process extraction for scholarship {}", user.id, id);
    let extracted = state.extractor.extract(url, &scholarship.title).await?;

    if extracted.steps.is_empty() {
        return Err(ApiError::internal("failed to extract steps", extracted.raw));
    }

    let steps = serde_json::to_value(&extracted.steps).map_err(|e| ApiError::internal("fetch failed", e))?;
    state.postgres.set_process_steps(id, &steps).await?;
    state.catalog.invalidate(ListingKind::Scholarship).await;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "steps": steps })))
}
