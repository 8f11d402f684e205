use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::{ErrorResponse, PatchError};
use crate::services::{ExtractError, IdentityError, PostgresError, TokenError};

/// Error returned by request handlers
///
/// Renders as `{ error, message, status_code }`; `error` is the text the
/// frontend shows.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{context}")]
    Internal { context: String, detail: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(context: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::Internal {
            context: context.into(),
            detail: detail.to_string(),
        }
    }

    /// First validation message, by field name
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .flat_map(|(_, errs)| errs.iter())
            .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
            .next()
            .unwrap_or_else(|| "Validation failed".to_string());

        ApiError::BadRequest(message)
    }

    fn body(&self) -> ErrorResponse {
        let status = self.status_code();
        let message = match self {
            ApiError::Internal { detail, .. } => detail.clone(),
            _ => status.canonical_reason().unwrap_or("Error").to_string(),
        };

        ErrorResponse {
            error: self.to_string(),
            message,
            status_code: status.as_u16(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal { context, detail } = self {
            tracing::error!("{}: {}", context, detail);
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

impl From<PostgresError> for ApiError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Conflict(message) | PostgresError::InvalidInput(message) => ApiError::BadRequest(message),
            PostgresError::NotFound(message) => ApiError::NotFound(message),
            other => ApiError::internal("Database error", other),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => ApiError::unauthorized("invalid token"),
            other => ApiError::internal("Server error", other),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotConfigured => ApiError::internal(
                "Server configuration error: Firebase authentication not available",
                "Contact administrator - Firebase project is not configured",
            ),
            IdentityError::Expired => ApiError::unauthorized("Google sign-in session expired. Please try again."),
            IdentityError::UnknownKey | IdentityError::InvalidToken(_) => {
                ApiError::unauthorized("Invalid Google sign-in token. Please try again.")
            }
            other => ApiError::internal("Authentication failed. Please try again later.", other),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        ApiError::internal("fetch failed", err)
    }
}

impl From<PatchError> for ApiError {
    fn from(err: PatchError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    });
    InternalError::from_response(err, response).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    });
    InternalError::from_response(err, response).into()
}
