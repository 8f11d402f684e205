use actix_web::{web, HttpResponse};
use serde_json::Value;

use super::AppState;
use crate::core::rank_eligible;
use crate::error::ApiError;
use crate::models::{ListingKind, MatchEntry, MatchRequest, MatchResponse, Profile};

/// Configure match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/match", web::post().to(match_profile));
}

/// Parse the submitted profile; anything but a JSON object is rejected
fn submitted_profile(raw: Option<Value>) -> Result<Profile, ApiError> {
    match raw {
        Some(Value::Object(body)) => {
            Profile::from_submitted(body).map_err(|e| ApiError::bad_request(format!("invalid profile: {}", e)))
        }
        _ => Err(ApiError::bad_request("profile object required in request body")),
    }
}

/// Match a submitted profile against all scholarships
///
/// POST /api/match
///
/// Request body:
/// ```json
/// {
///   "profile": { "course": "B.Tech CSE", "last_semester_marks": 8.5, ... }
/// }
/// ```
async fn match_profile(state: web::Data<AppState>, req: web::Json<MatchRequest>) -> Result<HttpResponse, ApiError> {
    let profile = submitted_profile(req.into_inner().profile)?;

    let scholarships = state.catalog.listings(ListingKind::Scholarship).await?;
    let matches: Vec<MatchEntry> = rank_eligible(&profile, &scholarships)
        .into_iter()
        .map(|ranked| MatchEntry {
            scholarship: ranked.listing.summary_json(ListingKind::Scholarship),
            score: ranked.score,
        })
        .collect();

    tracing::info!(
        "Matched profile against {} scholarships, {} eligible",
        scholarships.len(),
        matches.len()
    );

    Ok(HttpResponse::Ok().json(MatchResponse { matches }))
}
