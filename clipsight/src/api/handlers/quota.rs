use axum::{debug_handler, extract::State, response::IntoResponse, Extension, Json};
use chrono::Utc;

use crate::api::auth::VerifiedClaim;
use crate::api::error::AppError;
use crate::app_state::SharedAppState;
use crate::services::quota::profile::ProfileStoreError;

/// Report the caller's current usage without counting the lookup itself
/// against the quota.
#[utoipa::path(
    get,
    path = "/api/v1/quota",
    responses(
    (status = 200, description = "Current quota usage for the authenticated caller"),
    (status = 401, description = "Authentication required")
    )
)]
#[debug_handler]
pub async fn quota_status_handler(
    State(state): State<SharedAppState>,
    Extension(claim): Extension<VerifiedClaim>,
) -> Result<impl IntoResponse, AppError> {
    let status = state
        .admission
        .peek_authenticated(&claim.subject_id, Utc::now())
        .await
        .map_err(|err| match err {
            ProfileStoreError::NotFound(user) => {
                AppError::ProfileNotFound(user)
            }
            ProfileStoreError::Unavailable(reason) => AppError::InternalServerError(reason),
        })?;

    let json_response = serde_json::json!({
        "tier": status.tier,
        "limit": status.limit,
        "used": status.used,
        "remaining": status.remaining(),
        "resets_at": status.resets_at,
    });

    Ok(Json(json_response))
}
