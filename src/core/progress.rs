//! Profile completeness and the dashboard's suggested next step.

use crate::models::{NextBestAction, Profile};

/// Fields counted towards profile completion
const COMPLETION_FIELD_COUNT: usize = 14;

/// Percentage of completion fields that are filled, rounded to a whole number
pub fn profile_completion(profile: Option<&Profile>) -> u32 {
    let Some(p) = profile else {
        return 0;
    };

    let filled = [
        p.full_name.is_some(),
        p.course.is_some(),
        p.date_of_birth.is_some(),
        p.year_of_study.is_some(),
        p.income.is_some(),
        p.caste.is_some(),
        p.tenth_percentage.is_some(),
        p.twelfth_percentage.is_some(),
        p.last_semester_marks.is_some(),
        p.address_line1.is_some(),
        p.city.is_some(),
        p.state.is_some(),
        p.postal_code.is_some(),
        p.country.is_some(),
    ]
    .iter()
    .filter(|filled| **filled)
    .count();

    ((filled as f64 / COMPLETION_FIELD_COUNT as f64) * 100.0).round() as u32
}

/// Labels of the critical fields that are still empty
pub fn missing_fields(profile: Option<&Profile>) -> Vec<String> {
    let Some(p) = profile else {
        return vec!["All profile fields".to_string()];
    };

    [
        (p.course.is_none(), "Course"),
        (p.year_of_study.is_none(), "Year of Study"),
        (p.tenth_percentage.is_none(), "10th Grade %"),
        (p.twelfth_percentage.is_none(), "12th Grade %"),
        (p.income.is_none(), "Family Income"),
    ]
    .into_iter()
    .filter(|(missing, _)| *missing)
    .map(|(_, label)| label.to_string())
    .collect()
}

fn action(title: &str, description: String, action: &str, link: &str, icon: &str) -> NextBestAction {
    NextBestAction {
        title: title.to_string(),
        description,
        action: action.to_string(),
        link: link.to_string(),
        icon: icon.to_string(),
    }
}

/// Suggested next step given the profile state and number of matches
pub fn next_best_action(profile: Option<&Profile>, completion: u32, total_matches: usize) -> NextBestAction {
    if profile.is_none() {
        return action(
            "Create Your Profile",
            "Get started by setting up your profile to unlock personalized opportunities".to_string(),
            "Start Now",
            "/profile",
            "👤",
        );
    }

    if completion < 50 {
        return action(
            "Complete Your Profile",
            format!(
                "You're {}% done! Complete your profile to unlock more matches",
                completion
            ),
            "Complete Profile",
            "/profile",
            "✏️",
        );
    }

    match total_matches {
        0 => action(
            "Update Your Preferences",
            "Adjust your profile details to discover more opportunities".to_string(),
            "Update Profile",
            "/profile",
            "🔧",
        ),
        1..=4 => {
            let noun = if total_matches == 1 { "opportunity" } else { "opportunities" };
            action(
                "Explore Your Matches",
                format!("You have {} personalized {} waiting!", total_matches, noun),
                "View Matches",
                "/scholarships",
                "🎯",
            )
        }
        _ => action(
            "Start Applying",
            format!(
                "Amazing! You've matched with {} opportunities. Time to apply!",
                total_matches
            ),
            "See All Matches",
            "/scholarships",
            "🚀",
        ),
    }
}
