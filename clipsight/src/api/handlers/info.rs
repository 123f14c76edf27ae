use axum::{debug_handler, extract::State, response::IntoResponse, Json};

use crate::app_state::SharedAppState;

#[utoipa::path(
    get,
    path = "/api/v1/info",
    responses(
    (status = 200, description = "Some global info of the running server.")
    )
)]
#[debug_handler]
pub async fn info_handler(State(state): State<SharedAppState>) -> impl IntoResponse {
    let quota = &state.settings.quota;
    let json_response = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "anonymous_daily_limit": quota.anonymous_daily_limit,
        "tier_limits": {
            "free": quota.tier_limits.free,
            "starter": quota.tier_limits.starter,
            "pro": quota.tier_limits.pro,
            "enterprise": quota.tier_limits.enterprise,
        },
    });
    Json(json_response)
}
