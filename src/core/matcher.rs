use chrono::{NaiveDate, Utc};

use crate::core::filters::{
    check_age, check_caste, check_country, check_course, check_disability, check_gpa, check_income,
    check_last_semester, check_state, check_tenth, check_twelfth, check_year, Check,
};
use crate::models::{Criteria, Listing, MatchResult, Profile};

/// An eligible listing with its score
#[derive(Debug, Clone, Copy)]
pub struct RankedListing<'a> {
    pub listing: &'a Listing,
    pub score: f64,
}

/// Evaluate a profile against one listing's criteria as of today (UTC)
pub fn evaluate(profile: &Profile, criteria: &Criteria) -> MatchResult {
    evaluate_at(profile, criteria, Utc::now().date_naive())
}

/// Evaluate a profile against one listing's criteria
///
/// Every criterion is checked, even after one has failed: passing criteria
/// keep adding to the score, so `score` only ranks anything when `eligible`
/// is true.
pub fn evaluate_at(profile: &Profile, criteria: &Criteria, today: NaiveDate) -> MatchResult {
    let checks = [
        check_gpa(profile, criteria),
        check_year(profile, criteria),
        check_age(profile, criteria, today),
        check_course(profile, criteria),
        check_income(profile, criteria),
        check_caste(profile, criteria),
        check_disability(profile, criteria),
        check_country(profile, criteria),
        check_state(profile, criteria),
        check_tenth(profile, criteria),
        check_twelfth(profile, criteria),
        check_last_semester(profile, criteria),
    ];

    let mut eligible = true;
    let mut score = 0.0;

    for check in checks {
        match check {
            Check::Unconstrained => {}
            Check::Pass(delta) => score += delta,
            Check::Fail => eligible = false,
        }
    }

    MatchResult { eligible, score }
}

/// Eligible listings for a profile, highest score first
pub fn rank_eligible<'a>(profile: &Profile, listings: &'a [Listing]) -> Vec<RankedListing<'a>> {
    rank_eligible_at(profile, listings, Utc::now().date_naive())
}

/// Eligible listings for a profile as of `today`, highest score first
///
/// Listings whose stored criteria do not parse are treated as unconstrained.
/// Ties keep their input order.
pub fn rank_eligible_at<'a>(
    profile: &Profile,
    listings: &'a [Listing],
    today: NaiveDate,
) -> Vec<RankedListing<'a>> {
    let mut ranked: Vec<RankedListing<'a>> = listings
        .iter()
        .filter_map(|listing| {
            let result = evaluate_at(profile, &listing.parsed_criteria(), today);
            result.eligible.then_some(RankedListing {
                listing,
                score: result.score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn create_listing(id: i64, criteria: Value) -> Listing {
        Listing {
            id,
            title: format!("Listing {}", id),
            sponsor: None,
            description: None,
            reward: None,
            due_date: None,
            application_url: None,
            process_steps: None,
            criteria: Some(criteria),
            tags: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_profile() -> Profile {
        Profile {
            last_semester_marks: Some(8.5),
            year_of_study: Some(3),
            tenth_percentage: Some(92.0),
            twelfth_percentage: Some(88.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_criteria_always_eligible() {
        let result = evaluate_at(&Profile::default(), &Criteria::default(), today());
        assert_eq!(result, MatchResult { eligible: true, score: 0.0 });
    }

    #[test]
    fn test_scenario_score() {
        let criteria = Criteria {
            gpa_min: Some(8.0),
            year_in: Some(vec![Some(2), Some(3), Some(4)]),
            min_10_percentage: Some(85.0),
            ..Default::default()
        };

        let result = evaluate_at(&create_profile(), &criteria, today());
        assert!(result.eligible);
        assert!((result.score - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_criterion_keeps_scoring() {
        let profile = Profile {
            year_of_study: Some(2),
            income: Some(500000.0),
            ..Default::default()
        };
        let criteria = Criteria {
            year_in: Some(vec![Some(2)]),
            max_income: Some(100000.0),
            ..Default::default()
        };

        let result = evaluate_at(&profile, &criteria, today());
        assert!(!result.eligible);
        assert_eq!(result.score, 5.0);
    }

    #[test]
    fn test_age_scores_even_after_earlier_failure() {
        let profile = Profile {
            date_of_birth: Some("2005-01-01".to_string()),
            ..Default::default()
        };
        let criteria = Criteria {
            gpa_min: Some(7.0),
            age_min: Some(18.0),
            ..Default::default()
        };

        let result = evaluate_at(&profile, &criteria, today());
        assert!(!result.eligible);
        assert_eq!(result.score, 5.0);
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let criteria = Criteria {
            gpa_min: Some(8.0),
            course_in: Some(vec!["tech".to_string()]),
            ..Default::default()
        };
        let profile = create_profile();

        let first = evaluate(&profile, &criteria);
        let second = evaluate(&profile, &criteria);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rank_eligible_orders_by_score() {
        let listings = vec![
            create_listing(1, json!({"gpa_min": 8.0})),
            create_listing(2, json!({"gpa_min": 9.0})),
            create_listing(3, json!({"gpa_min": 6.0})),
            create_listing(4, json!({})),
        ];

        let ranked = rank_eligible_at(&create_profile(), &listings, today());
        let ids: Vec<i64> = ranked.iter().map(|r| r.listing.id).collect();

        assert_eq!(ids, vec![3, 1, 4]);
        assert_eq!(ranked[0].score, 25.0);
    }

    #[test]
    fn test_rank_eligible_keeps_ties_in_order() {
        let listings = vec![
            create_listing(10, json!({})),
            create_listing(11, json!(null)),
            create_listing(12, json!("{broken")),
        ];

        let ranked = rank_eligible_at(&Profile::default(), &listings, today());
        let ids: Vec<i64> = ranked.iter().map(|r| r.listing.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }
}
