use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};

use super::{AppState, AuthUser};
use crate::core::{missing_fields, next_best_action, profile_completion, rank_eligible, RankedListing};
use crate::error::ApiError;
use crate::models::{DashboardCounts, DashboardStats, ListingKind, Recommendation};
use crate::services::CountedTable;

const RECOMMENDATION_COUNT: usize = 3;

/// Configure dashboard routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard/stats", web::get().to(stats));
}

/// Top-ranked scholarships as dashboard cards
fn recommendations(ranked: &[RankedListing<'_>]) -> Vec<Recommendation> {
    ranked
        .iter()
        .take(RECOMMENDATION_COUNT)
        .map(|r| Recommendation {
            kind: ListingKind::Scholarship.singular().to_string(),
            id: r.listing.id,
            title: r.listing.title.clone(),
            description: r.listing.description.clone(),
            amount: r.listing.reward.clone(),
            match_score: r.score.round() as i64,
        })
        .collect()
}

/// GET /api/dashboard/stats
async fn stats(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = state.postgres.get_profile(user.id).await?;
    let completion = profile_completion(profile.as_ref());

    let Some(profile) = profile else {
        return Ok(HttpResponse::Ok().json(DashboardStats {
            profile_completion: completion,
            opportunities_available: 0,
            matches_found: 0,
            new_matches_today: 0,
            recommendations: Vec::new(),
            next_best_action: next_best_action(None, 0, 0),
            missing_fields: missing_fields(None),
            stats: None,
        }));
    };

    let scholarships = state.catalog.listings(ListingKind::Scholarship).await?;
    let ranked = rank_eligible(&profile, &scholarships);

    let internships = state.postgres.count_capped(CountedTable::Internships).await?;
    let courses = state.postgres.count_capped(CountedTable::Courses).await?;
    let new_matches_today = state
        .postgres
        .count_notifications_since(user.id, Utc::now() - Duration::hours(24))
        .await?;

    let total_matches = ranked.len();

    Ok(HttpResponse::Ok().json(DashboardStats {
        profile_completion: completion,
        opportunities_available: scholarships.len() as i64 + internships + courses,
        matches_found: total_matches,
        new_matches_today,
        recommendations: recommendations(&ranked),
        next_best_action: next_best_action(Some(&profile), completion, total_matches),
        missing_fields: missing_fields(Some(&profile)),
        stats: Some(DashboardCounts {
            scholarships_matched: total_matches,
            internships_available: internships,
            courses_available: courses,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Listing;

    fn listing(id: i64) -> Listing {
        Listing {
            id,
            title: format!("Scholarship {}", id),
            sponsor: None,
            description: Some("For engineers".to_string()),
            reward: Some("25000".to_string()),
            due_date: None,
            application_url: None,
            process_steps: None,
            criteria: None,
            tags: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_recommendations_take_top_three() {
        let listings: Vec<Listing> = (1..=5).map(listing).collect();
        let ranked: Vec<RankedListing<'_>> = listings
            .iter()
            .zip([30.5, 22.0, 13.5, 5.0, 0.0])
            .map(|(listing, score)| RankedListing { listing, score })
            .collect();

        let cards = recommendations(&ranked);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].id, 1);
        assert_eq!(cards[0].match_score, 31);
        assert_eq!(cards[2].match_score, 14);
        assert_eq!(cards[0].kind, "scholarship");
        assert_eq!(cards[0].amount.as_deref(), Some("25000"));
    }
}
