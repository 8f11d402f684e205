use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub status: String,
    pub database: bool,
    pub cache: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Session token issued after password sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Session token issued after federated sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginResponse {
    pub token: String,
    pub user_id: i64,
    pub email: String,
}

/// One eligible scholarship in a match response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntry {
    pub scholarship: Value,
    pub score: f64,
}

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchEntry>,
}

/// Suggested next step shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextBestAction {
    pub title: String,
    pub description: String,
    pub action: String,
    pub link: String,
    pub icon: String,
}

/// Top-ranked scholarship on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub match_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub scholarships_matched: usize,
    pub internships_available: i64,
    pub courses_available: i64,
}

/// Response for the dashboard stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub profile_completion: u32,
    pub opportunities_available: i64,
    pub matches_found: usize,
    pub new_matches_today: i64,
    pub recommendations: Vec<Recommendation>,
    pub next_best_action: NextBestAction,
    pub missing_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DashboardCounts>,
}

/// Result of a stateless GPA computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpaComputeResponse {
    pub calculation_type: String,
    pub total_credits: f64,
    pub total_grade_points: f64,
    pub gpa: f64,
}
