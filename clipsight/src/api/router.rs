use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use clipsight_core::quota::decision::QuotaExceededBody;
use clipsight_core::quota::tier::Tier;

use crate::api::admission::admission;
use crate::api::auth::{require_claim, resolve_claim};
use crate::api::handlers::analyze::{analyze_handler, AnalyzeRequest, __path_analyze_handler};
use crate::api::handlers::health::{health_checker_handler, __path_health_checker_handler};
use crate::api::handlers::info::{info_handler, __path_info_handler};
use crate::api::handlers::quota::{quota_status_handler, __path_quota_status_handler};
use crate::api::handlers::verify::{
    verify_credentials_handler, VerifyRequest, __path_verify_credentials_handler,
};
use crate::app_state::SharedAppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_checker_handler,
        info_handler,
        analyze_handler,
        verify_credentials_handler,
        quota_status_handler,
    ),
    components(
        schemas(AnalyzeRequest, VerifyRequest, QuotaExceededBody, Tier)
    ),
    tags(
        (name = "clipsight-service", description = "clipsight api")
    )
)]
struct ApiDoc;

pub struct ApiRoutes;

impl ApiRoutes {
    pub fn create(state: SharedAppState) -> Router {
        let api = ApiDoc::openapi();

        // Quota-guarded routes. Layers added later run first, so each stack
        // below reads bottom-up: resolve claim, (require it,) then admit
        // against the quota.
        let analyze_router = Router::new()
            .route("/api/v1/analyze", post(analyze_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), admission))
            .route_layer(middleware::from_fn_with_state(state.clone(), resolve_claim));

        // Authentication is checked before the counters so that a rejected
        // caller never consumes quota.
        let verify_router = Router::new()
            .route(
                "/api/v1/credentials/verify",
                post(verify_credentials_handler),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), admission))
            .route_layer(middleware::from_fn(require_claim))
            .route_layer(middleware::from_fn_with_state(state.clone(), resolve_claim));

        // The usage report is claim-gated but must not consume quota itself,
        // so it skips the admission layer.
        let status_router = Router::new()
            .route("/api/v1/quota", get(quota_status_handler))
            .route_layer(middleware::from_fn(require_claim))
            .route_layer(middleware::from_fn_with_state(state.clone(), resolve_claim));

        let public_router = Router::new()
            .route("/api/v1/health", get(health_checker_handler))
            .route("/api/v1/info", get(info_handler))
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()));

        Router::new()
            .merge(analyze_router)
            .merge(verify_router)
            .merge(status_router)
            .merge(public_router)
            .with_state(state)
    }
}
