//! Admission middleware: every guarded request passes through here before it
//! reaches business logic.
//!
//! The flow is the admission state machine: resolve the caller identity,
//! drive the matching counter store, then either annotate the response with
//! quota headers (allowed) or answer with a structured 429 (denied).

pub mod headers;


use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use clipsight_core::quota::decision::AdmissionDecision;
use clipsight_core::quota::identity::{resolve_identity, Identity};

use crate::api::auth::VerifiedClaim;
use crate::api::error::AppError;
use crate::app_state::SharedAppState;

use headers::apply_quota_headers;

/// Gate one request through the quota layer.
///
/// Must run after [`crate::api::auth::resolve_claim`] so that a verified
/// claim, when present, is already in the request extensions.
pub async fn admission(
    State(state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let verified_subject = req
        .extensions()
        .get::<VerifiedClaim>()
        .map(|claim| claim.subject_id.clone());

    let peer_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let identity = resolve_identity(
        verified_subject.as_deref(),
        req.headers(),
        peer_addr.as_deref(),
    );

    match state.admission.check(&identity).await {
        AdmissionDecision::Allowed(status) => {
            debug!(
                "Admitted {} ({}/{:?} used)",
                describe(&identity),
                status.used,
                status.limit
            );
            req.extensions_mut().insert(identity);
            let mut response = next.run(req).await;
            apply_quota_headers(response.headers_mut(), &status);
            Ok(response)
        }
        AdmissionDecision::Denied(status) => {
            debug!("Denied {} (limit {:?})", describe(&identity), status.limit);
            Err(AppError::QuotaExceeded(status))
        }
    }
}

fn describe(identity: &Identity) -> String {
    match identity {
        Identity::Authenticated { user_id } => format!("user {user_id}"),
        Identity::Anonymous { ip, .. } => format!("anonymous {ip}"),
    }
}
