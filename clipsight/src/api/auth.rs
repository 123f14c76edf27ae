use axum::{
    extract::{Request, State},
    http,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::api::error::AppError;
use crate::app_state::SharedAppState;

/// Identity claim verified by the auth layer. Admission consumes this as-is;
/// no cryptography happens in this crate.
#[derive(Debug, Clone)]
pub struct VerifiedClaim {
    pub subject_id: String,
}

/// Find the subject id owning a bearer token.
///
/// Uses constant-time comparison so response timing cannot be used to probe
/// for valid tokens.
fn find_subject_for_token(state: &SharedAppState, token: &str) -> Option<String> {
    for (subject_id, configured_token) in &state.settings.api.api_keys {
        if token.as_bytes().ct_eq(configured_token.as_bytes()).into() {
            return Some(subject_id.clone());
        }
    }
    None
}

/// Resolve an identity claim for the request, when one is offered.
///
/// A request without an `Authorization` header proceeds as anonymous. A
/// request that presents a token must present a valid one: an unknown token
/// is a 401, never a silent downgrade to anonymous tracking.
pub async fn resolve_claim(
    State(state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        match find_subject_for_token(&state, token) {
            Some(subject_id) => {
                debug!("Verified claim for subject {subject_id}");
                req.extensions_mut().insert(VerifiedClaim { subject_id });
            }
            None => {
                warn!(
                    "Rejecting unknown bearer token (starts with: {}...)",
                    token.chars().take(8).collect::<String>()
                );
                return Err(AppError::Unauthorized(
                    "Invalid bearer token".to_string(),
                ));
            }
        }
    }

    Ok(next.run(req).await)
}

/// Gate for endpoints that only authenticated callers may use.
pub async fn require_claim(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<VerifiedClaim>().is_none() {
        return Err(AppError::Unauthorized(
            "This endpoint requires authentication".to_string(),
        ));
    }
    Ok(next.run(req).await)
}
