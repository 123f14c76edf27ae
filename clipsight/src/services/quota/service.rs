use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use clipsight_core::quota::decision::{AdmissionDecision, QuotaStatus};
use clipsight_core::quota::identity::{AnonymousKey, Identity};
use clipsight_core::quota::period;
use clipsight_core::settings::quota::QuotaSettings;

use super::anonymous::AnonymousCounter;
use super::profile::{ProfileStoreError, UserProfileStore};

/// The admission orchestrator: resolve policy for the identity, drive the
/// appropriate counter store, produce Allow/Deny plus quota metadata.
///
/// Each request is evaluated exactly once; there are no retries. Counter
/// increments happen on the request path and their result is always part of
/// the returned decision, never fired and forgotten.
pub struct AdmissionService {
    settings: QuotaSettings,
    profiles: Arc<dyn UserProfileStore>,
    anonymous: Arc<dyn AnonymousCounter>,
}

impl AdmissionService {
    pub fn new(
        settings: QuotaSettings,
        profiles: Arc<dyn UserProfileStore>,
        anonymous: Arc<dyn AnonymousCounter>,
    ) -> Self {
        AdmissionService {
            settings,
            profiles,
            anonymous,
        }
    }

    /// Check one request against its quota.
    ///
    /// Store failures (unreachable backend, missing profile record) resolve
    /// to Allowed: availability of the service beats strictness of a soft
    /// usage cap. Callers never learn that a counter backend was down.
    pub async fn check(&self, identity: &Identity) -> AdmissionDecision {
        let now = Utc::now();
        match identity {
            Identity::Authenticated { user_id } => self.check_authenticated(user_id, now).await,
            Identity::Anonymous { ip, fingerprint } => {
                let key = AnonymousKey::derive(ip, fingerprint.as_deref());
                self.check_anonymous(&key, now).await
            }
        }
    }

    /// Read-only view of an authenticated caller's current usage. Does not
    /// count against the quota.
    pub async fn peek_authenticated(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, ProfileStoreError> {
        let record = self.profiles.fetch(user_id).await?;
        let limit = self.settings.tier_limits.limit_for(record.tier);
        let used = if record.last_request_date == period::day_stamp(now) {
            record.daily_requests
        } else {
            0
        };
        Ok(QuotaStatus {
            limit: Some(limit),
            used: used.min(limit),
            resets_at: period::next_midnight(now),
            tier: Some(record.tier),
        })
    }

    async fn check_authenticated(&self, user_id: &str, now: DateTime<Utc>) -> AdmissionDecision {
        let today = period::day_stamp(now);
        let resets_at = period::next_midnight(now);

        let record = match self.profiles.fetch(user_id).await {
            Ok(record) => record,
            Err(ProfileStoreError::NotFound(_)) => {
                // A valid-but-unsynced account must not be locked out.
                warn!("No profile record for user {user_id}, allowing without quota");
                return AdmissionDecision::Allowed(QuotaStatus::unlimited(resets_at, None));
            }
            Err(ProfileStoreError::Unavailable(reason)) => {
                warn!("Profile store unavailable ({reason}), failing open for user {user_id}");
                return AdmissionDecision::Allowed(QuotaStatus::unlimited(resets_at, None));
            }
        };

        let limit = self.settings.tier_limits.limit_for(record.tier);

        // Short-circuit once the limit has already been tripped today, so the
        // stored counter stops growing under a flood of denied requests. The
        // request that trips the limit is itself still recorded below.
        if record.last_request_date == today && record.daily_requests > limit {
            debug!(
                "User {user_id} already over limit ({}/{limit}), denying without increment",
                record.daily_requests
            );
            return AdmissionDecision::Denied(QuotaStatus {
                limit: Some(limit),
                used: limit,
                resets_at,
                tier: Some(record.tier),
            });
        }

        let snapshot = match self.profiles.record_usage(user_id, &today).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Recording usage for user {user_id} failed ({err}), failing open");
                return AdmissionDecision::Allowed(QuotaStatus::unlimited(
                    resets_at,
                    Some(record.tier),
                ));
            }
        };

        let status = QuotaStatus {
            limit: Some(limit),
            used: snapshot.daily_requests.min(limit),
            resets_at,
            tier: Some(snapshot.tier),
        };

        if snapshot.daily_requests > limit {
            AdmissionDecision::Denied(status)
        } else {
            AdmissionDecision::Allowed(status)
        }
    }

    async fn check_anonymous(&self, key: &AnonymousKey, now: DateTime<Utc>) -> AdmissionDecision {
        let limit = self.settings.anonymous_daily_limit;
        let resets_at = period::next_midnight(now);

        let count = match self.anonymous.increment(key, resets_at).await {
            Ok(count) => count,
            Err(err) => {
                // Fail-open: a dead cache must not turn into a 429.
                warn!("Anonymous counter unavailable ({err}), failing open");
                return AdmissionDecision::Allowed(QuotaStatus::unlimited(resets_at, None));
            }
        };

        let status = QuotaStatus {
            limit: Some(limit),
            used: count.min(limit),
            resets_at,
            tier: None,
        };

        if count > limit {
            AdmissionDecision::Denied(status)
        } else {
            AdmissionDecision::Allowed(status)
        }
    }
}
