use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quota::tier::Tier;

/// Response header carrying the total limit for the current period.
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
/// Response header carrying the remaining requests in the current period.
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
/// Response header carrying the unix timestamp at which the period resets.
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// What the counters observed for one request.
///
/// `limit == None` means the quota layer failed open (store unavailable,
/// missing profile record) and no meaningful numbers exist for this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaStatus {
    pub limit: Option<u64>,
    pub used: u64,
    pub resets_at: DateTime<Utc>,
    pub tier: Option<Tier>,
}

impl QuotaStatus {
    /// A status for a call that bypassed counting entirely (fail-open).
    pub fn unlimited(resets_at: DateTime<Utc>, tier: Option<Tier>) -> Self {
        QuotaStatus {
            limit: None,
            used: 0,
            resets_at,
            tier,
        }
    }

    pub fn remaining(&self) -> u64 {
        match self.limit {
            Some(limit) => limit.saturating_sub(self.used),
            None => u64::MAX,
        }
    }
}

/// Outcome of the admission check. Terminal; each request is evaluated
/// exactly once, there is no retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allowed(QuotaStatus),
    Denied(QuotaStatus),
}

impl AdmissionDecision {
    pub fn status(&self) -> &QuotaStatus {
        match self {
            AdmissionDecision::Allowed(status) | AdmissionDecision::Denied(status) => status,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed(_))
    }
}

/// JSON body returned with a 429 when the daily quota is exhausted.
///
/// `upgrade` is a non-null suggestion naming the next tier only for free-tier
/// callers; for every other tier (and for anonymous callers) it is serialized
/// as an explicit `null`, never omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct QuotaExceededBody {
    pub error: String,
    pub message: String,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    pub upgrade: Option<String>,
}

impl QuotaExceededBody {
    pub fn from_status(status: &QuotaStatus) -> Self {
        let limit = status.limit.unwrap_or(0);
        let upgrade = match status.tier {
            Some(Tier::Free) => Tier::Free.next().map(|next| {
                format!("Daily limit reached. Upgrade to the {next} plan for a higher quota.")
            }),
            _ => None,
        };

        QuotaExceededBody {
            error: "quota_exceeded".to_string(),
            message: format!("Daily request limit of {limit} reached. Quota resets at midnight UTC."),
            limit,
            remaining: status.remaining(),
            reset_at: status.resets_at,
            tier: status.tier,
            upgrade,
        }
    }
}
