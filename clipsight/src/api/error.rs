use axum::http::StatusCode;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use clipsight_core::quota::decision::{QuotaExceededBody, QuotaStatus};

use super::admission::headers::apply_quota_headers;

#[derive(Clone, Error, Debug)]
pub enum AppError {
    #[error("Missing or invalid authentication")]
    Unauthorized(String),

    #[error("Daily request quota exhausted")]
    QuotaExceeded(QuotaStatus),

    #[error("Too many verification attempts")]
    VerificationRateLimited,

    #[error("No profile record for user: {0}")]
    ProfileNotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        if let Some(app_error) = e.downcast_ref::<AppError>() {
            return app_error.clone();
        }
        AppError::InternalServerError(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Quota denials are a decision outcome, not a failure: 429 with
            // the structured body and the rate-limit headers.
            AppError::QuotaExceeded(status) => {
                let body = QuotaExceededBody::from_status(&status);
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                apply_quota_headers(response.headers_mut(), &status);
                response
            }
            AppError::VerificationRateLimited => {
                let body = serde_json::json!({
                    "error": "rate_limited",
                    "message": "Too many credential verification attempts, try again later.",
                });
                (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
            }
            AppError::ProfileNotFound(user) => {
                let body = serde_json::json!({
                    "error": "profile_not_found",
                    "message": format!("No profile record for user: {user}"),
                });
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            AppError::Unauthorized(message) => {
                let body = serde_json::json!({
                    "error": "unauthorized",
                    "message": message,
                });
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            AppError::InternalServerError(message) => {
                let body = serde_json::json!({
                    "error": "internal_server_error",
                    "message": message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
