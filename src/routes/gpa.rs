use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{AppState, AuthUser};
use crate::core::{cgpa, round2, sgpa, GpaSummary, GradingScale};
use crate::error::ApiError;
use crate::models::{ComputeGpaRequest, GpaComputeResponse, SaveCalculationRequest};

/// Configure GPA routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gpa")
            .route("/calculations", web::get().to(list_calculations))
            .route("/calculations", web::post().to(save_calculation))
            .route("/calculations/{id}", web::delete().to(delete_calculation))
            .route("/latest", web::get().to(latest_calculation))
            .route("/compute", web::post().to(compute)),
    );
}

/// GET /api/gpa/calculations
async fn list_calculations(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let calculations = state.postgres.list_calculations(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "calculations": calculations })))
}

/// GET /api/gpa/latest
async fn latest_calculation(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let calculation = state.postgres.latest_calculation(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "calculation": calculation })))
}

/// POST /api/gpa/calculations
async fn save_calculation(
    user: AuthUser,
    state: web::Data<AppState>,
    req: web::Json<SaveCalculationRequest>,
) -> Result<HttpResponse, ApiError> {
    let new = req
        .into_inner()
        .into_new()
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;

    let calculation = state.postgres.insert_calculation(user.id, &new).await?;
    tracing::debug!("Saved {} calculation {} for user {}", new.calculation_type, calculation.id, user.id);

    Ok(HttpResponse::Ok().json(json!({
        "calculation": calculation,
        "message": "Calculation saved successfully",
    })))
}

/// DELETE /api/gpa/calculations/{id}
async fn delete_calculation(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let owner = state
        .postgres
        .calculation_owner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Calculation not found"))?;

    if owner != user.id {
        tracing::warn!("User {} tried to delete calculation {} owned by {}", user.id, id, owner);
        return Err(ApiError::Forbidden("Unauthorized".to_string()));
    }

    state.postgres.delete_calculation(id).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "message": "Calculation deleted" })))
}

fn rounded(calculation_type: &str, summary: GpaSummary) -> GpaComputeResponse {
    GpaComputeResponse {
        calculation_type: calculation_type.to_string(),
        total_credits: summary.total_credits,
        total_grade_points: round2(summary.total_grade_points),
        gpa: round2(summary.gpa),
    }
}

/// Run the calculator without saving; semesters give a CGPA, courses an SGPA
fn compute_summary(req: &ComputeGpaRequest) -> Result<GpaComputeResponse, ApiError> {
    if let Some(semesters) = req.semesters.as_deref().filter(|s| !s.is_empty()) {
        let summary = cgpa(semesters).ok_or_else(|| ApiError::bad_request("No credits to compute"))?;
        return Ok(rounded("cgpa", summary));
    }

    let courses = req
        .courses
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;

    let scale = match req.grading_scale.as_deref() {
        None => GradingScale::TenPoint,
        Some(raw) => GradingScale::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown grading scale: {}", raw)))?,
    };

    let summary = sgpa(scale, courses).ok_or_else(|| ApiError::bad_request("No credits to compute"))?;
    Ok(rounded("sgpa", summary))
}

/// POST /api/gpa/compute
async fn compute(req: web::Json<ComputeGpaRequest>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(compute_summary(&req)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseEntry, SemesterEntry};

    fn course(credits: f64, grade: &str) -> CourseEntry {
        CourseEntry {
            name: None,
            credits: Some(credits),
            grade: Some(grade.to_string()),
        }
    }

    #[test]
    fn test_compute_sgpa() {
        let req = ComputeGpaRequest {
            grading_scale: Some("10-point".to_string()),
            courses: Some(vec![course(4.0, "A+"), course(3.0, "B")]),
            semesters: None,
        };

        let result = compute_summary(&req).unwrap();
        assert_eq!(result.calculation_type, "sgpa");
        assert_eq!(result.total_credits, 7.0);
        assert_eq!(result.gpa, 7.71);
    }

    #[test]
    fn test_compute_cgpa_prefers_semesters() {
        let req = ComputeGpaRequest {
            grading_scale: None,
            courses: Some(vec![course(4.0, "O")]),
            semesters: Some(vec![
                SemesterEntry {
                    name: None,
                    sgpa: Some(8.0),
                    credits: Some(20.0),
                },
                SemesterEntry {
                    name: None,
                    sgpa: Some(9.0),
                    credits: Some(20.0),
                },
            ]),
        };

        let result = compute_summary(&req).unwrap();
        assert_eq!(result.calculation_type, "cgpa");
        assert_eq!(result.gpa, 8.5);
    }

    #[test]
    fn test_compute_rejects_bad_input() {
        let empty = ComputeGpaRequest {
            grading_scale: None,
            courses: None,
            semesters: None,
        };
        assert!(compute_summary(&empty).is_err());

        let bad_scale = ComputeGpaRequest {
            grading_scale: Some("7-point".to_string()),
            courses: Some(vec![course(3.0, "A")]),
            semesters: None,
        };
        assert!(compute_summary(&bad_scale).is_err());

        let no_credits = ComputeGpaRequest {
            grading_scale: None,
            courses: Some(vec![course(0.0, "A")]),
            semesters: None,
        };
        assert!(compute_summary(&no_credits).is_err());
    }
}
