use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::lenient;

/// Student profile as stored and as submitted for matching
///
/// Only a subset of fields feeds the matcher; the rest is kept for the
/// profile page and completion tracking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub course: Option<String>,
    #[serde(rename = "dob", alias = "date_of_birth", default, deserialize_with = "lenient::text")]
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub year_of_study: Option<i64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub income: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub caste: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub disability: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub disability_details: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub tenth_marks: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub tenth_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub twelfth_marks: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub twelfth_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub last_semester_marks: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub address_line1: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub address_line2: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: Option<String>,
}

impl Profile {
    /// Read a profile submitted as a JSON object
    ///
    /// Deserializing `Profile` directly rejects a body carrying both `dob`
    /// and `date_of_birth`; here `dob` wins, as in [`ProfilePatch`].
    ///
    /// [`ProfilePatch`]: super::ProfilePatch
    pub fn from_submitted(mut body: Map<String, Value>) -> Result<Self, serde_json::Error> {
        if body.contains_key("dob") {
            body.remove("date_of_birth");
        }
        serde_json::from_value(Value::Object(body))
    }

    /// Helper to get disability as a bool, defaulting to false
    pub fn has_disability(&self) -> bool {
        self.disability.unwrap_or(false)
    }
}

/// Eligibility rules attached to a listing
///
/// Every field is optional and an empty list counts as absent; whatever is
/// present is combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub gpa_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer_list", skip_serializing_if = "Option::is_none")]
    pub year_in: Option<Vec<Option<i64>>>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub age_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub age_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Option::is_none")]
    pub course_in: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub max_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Option::is_none")]
    pub caste_in: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::strict_flag", skip_serializing_if = "Option::is_none")]
    pub disability_required: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Option::is_none")]
    pub country_in: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Option::is_none")]
    pub state_in: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub min_10_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub min_12_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub min_last_semester_marks: Option<f64>,
}

impl Criteria {
    /// Parse criteria as stored on a listing
    ///
    /// The column may hold a JSON object, a JSON string containing serialized
    /// JSON, or nothing. Anything that does not parse is an error; callers
    /// usually want [`Criteria::from_stored_or_default`].
    pub fn from_stored(stored: Option<&Value>) -> Result<Self, serde_json::Error> {
        match stored {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(Self::default()),
            Some(Value::String(raw)) => serde_json::from_str(raw),
            Some(other) => serde_json::from_value(other.clone()),
        }
    }

    /// Parse stored criteria, substituting "no constraints" when malformed
    pub fn from_stored_or_default(stored: Option<&Value>) -> Self {
        Self::from_stored(stored).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed listing criteria: {}", e);
            Self::default()
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of evaluating one profile against one listing's criteria
///
/// `score` only ranks anything when `eligible` is true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub eligible: bool,
    pub score: f64,
}

/// Kinds of opportunity listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Scholarship,
    Internship,
    Competition,
}

impl ListingKind {
    pub const ALL: [ListingKind; 3] = [
        ListingKind::Scholarship,
        ListingKind::Internship,
        ListingKind::Competition,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            ListingKind::Scholarship => "scholarships",
            ListingKind::Internship => "internships",
            ListingKind::Competition => "competitions",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            ListingKind::Scholarship => "scholarship",
            ListingKind::Internship => "internship",
            ListingKind::Competition => "competition",
        }
    }

    /// Column (and JSON key) naming who offers the listing
    pub fn sponsor_column(&self) -> &'static str {
        match self {
            ListingKind::Scholarship => "provider",
            ListingKind::Internship => "company",
            ListingKind::Competition => "organizer",
        }
    }

    /// Column (and JSON key) holding the money on offer
    pub fn reward_column(&self) -> &'static str {
        match self {
            ListingKind::Scholarship => "amount",
            ListingKind::Internship => "stipend",
            ListingKind::Competition => "prize_money",
        }
    }

    pub fn due_date_column(&self) -> &'static str {
        match self {
            ListingKind::Scholarship | ListingKind::Internship => "deadline",
            ListingKind::Competition => "event_date",
        }
    }

    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.table() == table)
    }
}

/// A scholarship, internship or competition
///
/// Kind-specific columns are folded into `sponsor`, `reward` and `due_date`;
/// [`Listing::to_json`] restores the kind-specific names for API output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub sponsor: Option<String>,
    pub description: Option<String>,
    pub reward: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub application_url: Option<String>,
    pub process_steps: Option<Value>,
    pub criteria: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn parsed_criteria(&self) -> Criteria {
        Criteria::from_stored_or_default(self.criteria.as_ref())
    }

    /// Full record with kind-specific key names
    pub fn to_json(&self, kind: ListingKind) -> Value {
        let mut map = self.summary_map(kind);
        map.insert("criteria".into(), self.criteria.clone().unwrap_or(Value::Null));
        map.insert("created_at".into(), json!(self.created_at));
        map.insert("updated_at".into(), json!(self.updated_at));
        Value::Object(map)
    }

    /// Record without criteria and timestamps, as embedded in match results
    pub fn summary_json(&self, kind: ListingKind) -> Value {
        Value::Object(self.summary_map(kind))
    }

    fn summary_map(&self, kind: ListingKind) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".into(), json!(self.id));
        map.insert("title".into(), json!(self.title));
        map.insert(kind.sponsor_column().into(), json!(self.sponsor));
        map.insert("description".into(), json!(self.description));
        map.insert(kind.reward_column().into(), json!(self.reward));
        map.insert(kind.due_date_column().into(), json!(self.due_date));
        map.insert("application_url".into(), json!(self.application_url));
        map.insert(
            "process_steps".into(),
            self.process_steps.clone().unwrap_or(Value::Null),
        );
        map.insert("tags".into(), json!(self.tags));
        map
    }
}

/// Registered account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: Option<String>,
    pub auth_provider: String,
    pub google_id: Option<String>,
}

/// In-app notification
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub scholarship_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Option<Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub scholarship_title: Option<String>,
}

/// Saved GPA calculation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GpaCalculation {
    pub id: i64,
    pub user_id: i64,
    pub calculation_type: String,
    pub semester_name: Option<String>,
    pub grading_scale: String,
    pub courses: Value,
    pub total_credits: f64,
    pub total_grade_points: Option<f64>,
    pub gpa: f64,
    pub previous_cgpa: Option<f64>,
    pub previous_credits: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_from_object() {
        let stored = json!({"gpa_min": "8.0", "year_in": [2, "3"], "course_in": ["CS"]});
        let criteria = Criteria::from_stored(Some(&stored)).unwrap();

        assert_eq!(criteria.gpa_min, Some(8.0));
        assert_eq!(criteria.year_in, Some(vec![Some(2), Some(3)]));
        assert_eq!(criteria.course_in, Some(vec!["CS".to_string()]));
    }

    #[test]
    fn test_submitted_profile_prefers_dob() {
        let body = json!({"dob": "2005-01-01", "date_of_birth": "1999-12-31", "course": "B.Sc"});
        let Value::Object(body) = body else { unreachable!() };

        let profile = Profile::from_submitted(body).unwrap();
        assert_eq!(profile.date_of_birth.as_deref(), Some("2005-01-01"));
        assert_eq!(profile.course.as_deref(), Some("B.Sc"));

        let Value::Object(long_form) = json!({"date_of_birth": "1999-12-31"}) else { unreachable!() };
        let profile = Profile::from_submitted(long_form).unwrap();
        assert_eq!(profile.date_of_birth.as_deref(), Some("1999-12-31"));
    }

    #[test]
    fn test_criteria_from_serialized_string() {
        let stored = Value::String(r#"{"max_income": 250000}"#.to_string());
        let criteria = Criteria::from_stored(Some(&stored)).unwrap();

        assert_eq!(criteria.max_income, Some(250000.0));
    }

    #[test]
    fn test_malformed_criteria_fall_back_to_empty() {
        let stored = Value::String("{not json".to_string());
        assert!(Criteria::from_stored(Some(&stored)).is_err());
        assert!(Criteria::from_stored_or_default(Some(&stored)).is_empty());

        let stored = json!([1, 2, 3]);
        assert!(Criteria::from_stored_or_default(Some(&stored)).is_empty());
    }

    #[test]
    fn test_disability_required_only_counts_literal_true() {
        let stored = json!({"disability_required": "true"});
        let criteria = Criteria::from_stored(Some(&stored)).unwrap();
        assert_eq!(criteria.disability_required, None);
    }

    #[test]
    fn test_profile_accepts_dob_alias_and_strings() {
        let profile: Profile = serde_json::from_value(json!({
            "date_of_birth": "2004-05-17",
            "year_of_study": "3",
            "last_semester_marks": "8.5",
            "income": "",
            "course": "B.Tech"
        }))
        .unwrap();

        assert_eq!(profile.date_of_birth.as_deref(), Some("2004-05-17"));
        assert_eq!(profile.year_of_study, Some(3));
        assert_eq!(profile.last_semester_marks, Some(8.5));
        assert_eq!(profile.income, None);
    }

    #[test]
    fn test_listing_json_uses_kind_names() {
        let listing = Listing {
            id: 7,
            title: "Merit Award".to_string(),
            sponsor: Some("Acme".to_string()),
            description: None,
            reward: Some("50000".to_string()),
            due_date: NaiveDate::from_ymd_opt(2026, 12, 31),
            application_url: None,
            process_steps: None,
            criteria: Some(json!({"gpa_min": 8})),
            tags: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let internship = listing.to_json(ListingKind::Internship);
        assert_eq!(internship["company"], "Acme");
        assert_eq!(internship["stipend"], "50000");
        assert_eq!(internship["deadline"], "2026-12-31");

        let competition = listing.summary_json(ListingKind::Competition);
        assert_eq!(competition["organizer"], "Acme");
        assert_eq!(competition["event_date"], "2026-12-31");
        assert!(competition.get("criteria").is_none());
    }

    #[test]
    fn test_listing_kind_tables() {
        for kind in ListingKind::ALL {
            assert_eq!(ListingKind::from_table(kind.table()), Some(kind));
        }
        assert_eq!(ListingKind::from_table("courses"), None);
    }
}
