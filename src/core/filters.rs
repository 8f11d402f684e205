use chrono::NaiveDate;

use crate::core::age::calculate_age;
use crate::models::{Criteria, Profile};

/// Verdict of a single criterion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Check {
    /// The criterion is not set on the listing
    Unconstrained,
    /// Satisfied, with its score contribution
    Pass(f64),
    Fail,
}

impl Check {
    #[inline]
    fn from_bool(passed: bool, score: f64) -> Self {
        if passed {
            Check::Pass(score)
        } else {
            Check::Fail
        }
    }
}

/// A list criterion only constrains when it has at least one entry
#[inline]
fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    list.as_deref().filter(|items| !items.is_empty())
}

/// Case-insensitive exact match against any listed value
#[inline]
fn matches_any(value: Option<&str>, accepted: &[String]) -> bool {
    match value {
        Some(v) => {
            let v = v.to_lowercase();
            accepted.iter().any(|a| a.to_lowercase() == v)
        }
        None => false,
    }
}

/// Threshold on a percentage or marks field; absent, zero and NaN values fail
#[inline]
fn threshold(value: Option<f64>, min: Option<f64>, weight: f64) -> Check {
    let Some(min) = min else {
        return Check::Unconstrained;
    };
    // NaN on either side never compares >=
    match value.filter(|v| *v != 0.0) {
        Some(v) if v >= min => Check::Pass((v - min) * weight),
        _ => Check::Fail,
    }
}

/// `gpa_min` against last semester marks
#[inline]
pub fn check_gpa(profile: &Profile, criteria: &Criteria) -> Check {
    let Some(min) = criteria.gpa_min else {
        return Check::Unconstrained;
    };
    match profile.last_semester_marks {
        Some(marks) if marks >= min => Check::Pass((marks - min) * 10.0),
        _ => Check::Fail,
    }
}

/// `year_in` against year of study
#[inline]
pub fn check_year(profile: &Profile, criteria: &Criteria) -> Check {
    let Some(years) = non_empty(&criteria.year_in) else {
        return Check::Unconstrained;
    };
    let passed = profile
        .year_of_study
        .filter(|y| *y != 0)
        .is_some_and(|y| years.contains(&Some(y)));
    Check::from_bool(passed, 5.0)
}

/// `age_min` / `age_max` against the age on `today`
#[inline]
pub fn check_age(profile: &Profile, criteria: &Criteria, today: NaiveDate) -> Check {
    if criteria.age_min.is_none() && criteria.age_max.is_none() {
        return Check::Unconstrained;
    }
    let Some(age) = profile
        .date_of_birth
        .as_deref()
        .and_then(|dob| calculate_age(dob, today))
    else {
        return Check::Fail;
    };

    let age = f64::from(age);
    let above_min = criteria.age_min.map_or(true, |min| age >= min);
    let below_max = criteria.age_max.map_or(true, |max| age <= max);
    Check::from_bool(above_min && below_max, 5.0)
}

/// `course_in`: the course must contain one of the listed values, ignoring case
#[inline]
pub fn check_course(profile: &Profile, criteria: &Criteria) -> Check {
    let Some(courses) = non_empty(&criteria.course_in) else {
        return Check::Unconstrained;
    };
    let passed = profile.course.as_deref().is_some_and(|course| {
        let course = course.to_lowercase();
        courses.iter().any(|c| course.contains(&c.to_lowercase()))
    });
    Check::from_bool(passed, 10.0)
}

/// `max_income`; only an income above the cap fails
///
/// A missing income passes, and so does a NaN on either side since it never
/// compares greater.
#[inline]
pub fn check_income(profile: &Profile, criteria: &Criteria) -> Check {
    let Some(max) = criteria.max_income else {
        return Check::Unconstrained;
    };
    let over_cap = profile.income.is_some_and(|income| income > max);
    Check::from_bool(!over_cap, 5.0)
}

#[inline]
pub fn check_caste(profile: &Profile, criteria: &Criteria) -> Check {
    match non_empty(&criteria.caste_in) {
        Some(castes) => Check::from_bool(matches_any(profile.caste.as_deref(), castes), 5.0),
        None => Check::Unconstrained,
    }
}

/// Only a literal `disability_required: true` constrains
#[inline]
pub fn check_disability(profile: &Profile, criteria: &Criteria) -> Check {
    if criteria.disability_required == Some(true) {
        Check::from_bool(profile.has_disability(), 5.0)
    } else {
        Check::Unconstrained
    }
}

#[inline]
pub fn check_country(profile: &Profile, criteria: &Criteria) -> Check {
    match non_empty(&criteria.country_in) {
        Some(countries) => Check::from_bool(matches_any(profile.country.as_deref(), countries), 3.0),
        None => Check::Unconstrained,
    }
}

#[inline]
pub fn check_state(profile: &Profile, criteria: &Criteria) -> Check {
    match non_empty(&criteria.state_in) {
        Some(states) => Check::from_bool(matches_any(profile.state.as_deref(), states), 2.0),
        None => Check::Unconstrained,
    }
}

#[inline]
pub fn check_tenth(profile: &Profile, criteria: &Criteria) -> Check {
    threshold(profile.tenth_percentage, criteria.min_10_percentage, 0.5)
}

#[inline]
pub fn check_twelfth(profile: &Profile, criteria: &Criteria) -> Check {
    threshold(profile.twelfth_percentage, criteria.min_12_percentage, 0.5)
}

#[inline]
pub fn check_last_semester(profile: &Profile, criteria: &Criteria) -> Check {
    threshold(profile.last_semester_marks, criteria.min_last_semester_marks, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_unset_criteria_do_not_constrain() {
        let profile = Profile::default();
        let criteria = Criteria::default();

        assert_eq!(check_gpa(&profile, &criteria), Check::Unconstrained);
        assert_eq!(check_age(&profile, &criteria, today()), Check::Unconstrained);
        assert_eq!(check_income(&profile, &criteria), Check::Unconstrained);
        assert_eq!(check_last_semester(&profile, &criteria), Check::Unconstrained);
    }

    #[test]
    fn test_empty_lists_do_not_constrain() {
        let criteria = Criteria {
            year_in: Some(vec![]),
            course_in: Some(vec![]),
            state_in: Some(vec![]),
            ..Default::default()
        };
        let profile = Profile::default();

        assert_eq!(check_year(&profile, &criteria), Check::Unconstrained);
        assert_eq!(check_course(&profile, &criteria), Check::Unconstrained);
        assert_eq!(check_state(&profile, &criteria), Check::Unconstrained);
    }

    #[test]
    fn test_gpa_threshold_boundary() {
        let criteria = Criteria {
            gpa_min: Some(8.0),
            ..Default::default()
        };
        let at = Profile {
            last_semester_marks: Some(8.0),
            ..Default::default()
        };
        let below = Profile {
            last_semester_marks: Some(7.99),
            ..Default::default()
        };

        assert_eq!(check_gpa(&at, &criteria), Check::Pass(0.0));
        assert_eq!(check_gpa(&below, &criteria), Check::Fail);
        assert_eq!(check_gpa(&Profile::default(), &criteria), Check::Fail);
    }

    #[test]
    fn test_nan_marks_fail() {
        let profile = Profile {
            last_semester_marks: Some(f64::NAN),
            tenth_percentage: Some(f64::NAN),
            ..Default::default()
        };
        let criteria = Criteria {
            gpa_min: Some(6.0),
            min_10_percentage: Some(60.0),
            ..Default::default()
        };

        assert_eq!(check_gpa(&profile, &criteria), Check::Fail);
        assert_eq!(check_tenth(&profile, &criteria), Check::Fail);
    }

    #[test]
    fn test_zero_percentage_counts_as_absent() {
        let profile = Profile {
            twelfth_percentage: Some(0.0),
            ..Default::default()
        };
        let criteria = Criteria {
            min_12_percentage: Some(0.0),
            ..Default::default()
        };
        assert_eq!(check_twelfth(&profile, &criteria), Check::Fail);
    }

    #[test]
    fn test_course_substring_ignores_case() {
        let criteria = Criteria {
            course_in: Some(vec!["CS".to_string()]),
            ..Default::default()
        };
        let engineering = Profile {
            course: Some("B.Tech in CS Engineering".to_string()),
            ..Default::default()
        };
        let biology = Profile {
            course: Some("Biology".to_string()),
            ..Default::default()
        };

        assert_eq!(check_course(&engineering, &criteria), Check::Pass(10.0));
        assert_eq!(check_course(&biology, &criteria), Check::Fail);
    }

    #[test]
    fn test_income_absent_passes() {
        let criteria = Criteria {
            max_income: Some(250000.0),
            ..Default::default()
        };
        let rich = Profile {
            income: Some(300000.0),
            ..Default::default()
        };

        assert_eq!(check_income(&Profile::default(), &criteria), Check::Pass(5.0));
        assert_eq!(check_income(&rich, &criteria), Check::Fail);
    }

    #[test]
    fn test_unreadable_income_is_not_over_cap() {
        let criteria = Criteria {
            max_income: Some(250000.0),
            ..Default::default()
        };
        let unreadable = Profile {
            income: Some(f64::NAN),
            ..Default::default()
        };
        let no_cap = Criteria {
            max_income: Some(f64::NAN),
            ..Default::default()
        };

        assert_eq!(check_income(&unreadable, &criteria), Check::Pass(5.0));
        assert_eq!(check_income(&Profile::default(), &no_cap), Check::Pass(5.0));
    }

    #[test]
    fn test_year_list_without_valid_entries_still_constrains() {
        let criteria = Criteria {
            year_in: Some(vec![None]),
            ..Default::default()
        };
        let second_year = Profile {
            year_of_study: Some(2),
            ..Default::default()
        };
        assert_eq!(check_year(&second_year, &criteria), Check::Fail);

        let mixed = Criteria {
            year_in: Some(vec![Some(2), None]),
            ..Default::default()
        };
        assert_eq!(check_year(&second_year, &mixed), Check::Pass(5.0));
    }

    #[test]
    fn test_exact_matches_ignore_case() {
        let criteria = Criteria {
            caste_in: Some(vec!["OBC".to_string(), "SC".to_string()]),
            country_in: Some(vec!["India".to_string()]),
            ..Default::default()
        };
        let profile = Profile {
            caste: Some("obc".to_string()),
            country: Some("INDIA".to_string()),
            ..Default::default()
        };

        assert_eq!(check_caste(&profile, &criteria), Check::Pass(5.0));
        assert_eq!(check_country(&profile, &criteria), Check::Pass(3.0));

        let partial = Profile {
            caste: Some("OB".to_string()),
            ..Default::default()
        };
        assert_eq!(check_caste(&partial, &criteria), Check::Fail);
    }

    #[test]
    fn test_disability_required() {
        let criteria = Criteria {
            disability_required: Some(true),
            ..Default::default()
        };
        let with = Profile {
            disability: Some(true),
            ..Default::default()
        };

        assert_eq!(check_disability(&with, &criteria), Check::Pass(5.0));
        assert_eq!(check_disability(&Profile::default(), &criteria), Check::Fail);

        let not_required = Criteria {
            disability_required: Some(false),
            ..Default::default()
        };
        assert_eq!(check_disability(&Profile::default(), &not_required), Check::Unconstrained);
    }

    #[test]
    fn test_age_bounds() {
        let criteria = Criteria {
            age_min: Some(18.0),
            age_max: Some(25.0),
            ..Default::default()
        };
        let eighteen = Profile {
            date_of_birth: Some("2008-10-16".to_string()),
            ..Default::default()
        };
        let seventeen = Profile {
            date_of_birth: Some("2008-10-17".to_string()),
            ..Default::default()
        };
        let garbled = Profile {
            date_of_birth: Some("not a date".to_string()),
            ..Default::default()
        };

        assert_eq!(check_age(&eighteen, &criteria, today()), Check::Pass(5.0));
        assert_eq!(check_age(&seventeen, &criteria, today()), Check::Fail);
        assert_eq!(check_age(&garbled, &criteria, today()), Check::Fail);
        assert_eq!(check_age(&Profile::default(), &criteria, today()), Check::Fail);
    }
}
