use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::lenient;

/// Request to create a password account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 6, message = "Password too short"))]
    #[serde(default)]
    pub password: String,
}

/// Password sign-in
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Federated sign-in with a Firebase ID token
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(rename = "idToken", alias = "id_token", default)]
    pub id_token: Option<String>,
}

/// Ad-hoc match of a submitted profile against all scholarships
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub profile: Option<Value>,
}

/// Body for creating or replacing a listing
///
/// Kind-specific keys (`provider`/`company`/`organizer`, ...) all land in the
/// shared fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListingDraft {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(
        default,
        alias = "provider",
        alias = "company",
        alias = "organizer",
        deserialize_with = "lenient::text"
    )]
    pub sponsor: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(
        default,
        alias = "amount",
        alias = "stipend",
        alias = "prize_money",
        deserialize_with = "lenient::text"
    )]
    pub reward: Option<String>,
    #[serde(
        default,
        alias = "deadline",
        alias = "event_date",
        deserialize_with = "lenient::date"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub application_url: Option<String>,
    #[serde(default)]
    pub process_steps: Option<Value>,
    #[serde(default)]
    pub criteria: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Legacy mark-as-read body
#[derive(Debug, Clone, Deserialize)]
pub struct MarkReadRequest {
    pub id: i64,
}

/// Save a GPA calculation; required fields are checked by the handler
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCalculationRequest {
    #[serde(default)]
    pub calculation_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub semester_name: Option<String>,
    #[serde(default)]
    pub grading_scale: Option<String>,
    #[serde(default)]
    pub courses: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_credits: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_grade_points: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub gpa: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub previous_cgpa: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub previous_credits: Option<f64>,
}

/// Validated calculation ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalculation {
    pub calculation_type: String,
    pub semester_name: Option<String>,
    pub grading_scale: String,
    pub courses: Value,
    pub total_credits: f64,
    pub total_grade_points: Option<f64>,
    pub gpa: f64,
    pub previous_cgpa: Option<f64>,
    pub previous_credits: Option<f64>,
}

impl SaveCalculationRequest {
    /// Check required fields; zero credits or a zero GPA count as missing
    pub fn into_new(self) -> Option<NewCalculation> {
        let present = |v: Option<f64>| v.filter(|n| n.is_finite() && *n != 0.0);

        Some(NewCalculation {
            calculation_type: self.calculation_type.filter(|s| !s.is_empty())?,
            semester_name: self.semester_name,
            grading_scale: self.grading_scale.filter(|s| !s.is_empty())?,
            courses: self.courses.filter(|c| !c.is_null())?,
            total_credits: present(self.total_credits)?,
            total_grade_points: self.total_grade_points.filter(|n| n.is_finite()),
            gpa: present(self.gpa)?,
            previous_cgpa: present(self.previous_cgpa),
            previous_credits: present(self.previous_credits),
        })
    }
}

/// One course row of the SGPA calculator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub credits: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub grade: Option<String>,
}

/// One semester row of the CGPA calculator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemesterEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sgpa: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub credits: Option<f64>,
}

/// Stateless GPA computation; send `courses` for SGPA or `semesters` for CGPA
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeGpaRequest {
    #[serde(default)]
    pub grading_scale: Option<String>,
    #[serde(default)]
    pub courses: Option<Vec<CourseEntry>>,
    #[serde(default)]
    pub semesters: Option<Vec<SemesterEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "student@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(ok.validate().is_ok());

        let short = RegisterRequest {
            email: "student@example.com".to_string(),
            password: "abc".to_string(),
        };
        assert!(short.validate().is_err());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_listing_draft_accepts_kind_keys() {
        let draft: ListingDraft = serde_json::from_value(json!({
            "title": "Summer Intern",
            "company": "Acme",
            "stipend": 15000,
            "deadline": "2026-12-01",
            "criteria": {"year_in": [3, 4]}
        }))
        .unwrap();

        assert_eq!(draft.sponsor.as_deref(), Some("Acme"));
        assert_eq!(draft.reward.as_deref(), Some("15000"));
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2026, 12, 1));
    }

    #[test]
    fn test_listing_draft_blank_date_is_none() {
        let draft: ListingDraft =
            serde_json::from_value(json!({"title": "Hackathon", "event_date": ""})).unwrap();
        assert_eq!(draft.due_date, None);
    }

    #[test]
    fn test_save_calculation_requires_fields() {
        let complete: SaveCalculationRequest = serde_json::from_value(json!({
            "calculationType": "sgpa",
            "gradingScale": "10-point",
            "courses": [{"name": "Maths", "credits": "4", "grade": "A"}],
            "totalCredits": 4,
            "totalGradePoints": 32,
            "gpa": "8.00"
        }))
        .unwrap();
        let new = complete.into_new().unwrap();
        assert_eq!(new.gpa, 8.0);
        assert_eq!(new.previous_cgpa, None);

        let missing_gpa: SaveCalculationRequest = serde_json::from_value(json!({
            "calculationType": "sgpa",
            "gradingScale": "10-point",
            "courses": [],
            "totalCredits": 4
        }))
        .unwrap();
        assert!(missing_gpa.into_new().is_none());
    }
}
