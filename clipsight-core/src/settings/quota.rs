use serde::Deserialize;
use std::collections::HashMap;

use crate::quota::tier::Tier;

/// Quota configuration validation error
#[derive(Debug)]
pub struct QuotaValidationError {
    pub message: String,
}

impl std::fmt::Display for QuotaValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Quota configuration error: {}", self.message)
    }
}

impl std::error::Error for QuotaValidationError {}

/// Daily request limits per subscription tier.
///
/// This is the whole TierPolicyTable: configuration loaded once at process
/// start, never derived state.
#[derive(Debug, Clone, Deserialize)]
pub struct TierLimits {
    #[serde(default = "default_free_limit")]
    pub free: u64,
    #[serde(default = "default_starter_limit")]
    pub starter: u64,
    #[serde(default = "default_pro_limit")]
    pub pro: u64,
    #[serde(default = "default_enterprise_limit")]
    pub enterprise: u64,
}

fn default_free_limit() -> u64 {
    5
}

fn default_starter_limit() -> u64 {
    100
}

fn default_pro_limit() -> u64 {
    500
}

fn default_enterprise_limit() -> u64 {
    2000
}

impl Default for TierLimits {
    fn default() -> Self {
        TierLimits {
            free: default_free_limit(),
            starter: default_starter_limit(),
            pro: default_pro_limit(),
            enterprise: default_enterprise_limit(),
        }
    }
}

impl TierLimits {
    /// Exhaustive lookup; there is no runtime fallback because [`Tier`] is a
    /// closed enum and unknown values already collapse to `Free` at
    /// deserialization time.
    pub fn limit_for(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Free => self.free,
            Tier::Starter => self.starter,
            Tier::Pro => self.pro,
            Tier::Enterprise => self.enterprise,
        }
    }

    /// Higher tiers must never have smaller limits than lower ones.
    pub fn validate(&self) -> Result<(), QuotaValidationError> {
        let ordered = [
            ("free", self.free),
            ("starter", self.starter),
            ("pro", self.pro),
            ("enterprise", self.enterprise),
        ];
        for window in ordered.windows(2) {
            let (lower_name, lower) = window[0];
            let (upper_name, upper) = window[1];
            if upper < lower {
                return Err(QuotaValidationError {
                    message: format!(
                        "{upper_name} limit ({upper}) must not be below {lower_name} limit ({lower})"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Fixed-window settings for the credential-verification limiter.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyActionSettings {
    #[serde(default = "default_max_per_window")]
    pub max_per_window: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_per_window() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    3600
}

impl Default for VerifyActionSettings {
    fn default() -> Self {
        VerifyActionSettings {
            max_per_window: default_max_per_window(),
            window_secs: default_window_secs(),
        }
    }
}

impl VerifyActionSettings {
    pub fn validate(&self) -> Result<(), QuotaValidationError> {
        if self.max_per_window == 0 {
            return Err(QuotaValidationError {
                message: "verify_action.max_per_window must be greater than 0".to_string(),
            });
        }
        if self.window_secs == 0 {
            return Err(QuotaValidationError {
                message: "verify_action.window_secs must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for the whole admission layer.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    #[serde(default)]
    pub tier_limits: TierLimits,

    /// Fixed daily limit for anonymous callers, shared by all tiers of
    /// anonymous traffic (there is only one).
    #[serde(default = "default_anonymous_daily_limit")]
    pub anonymous_daily_limit: u64,

    /// Redis connection URL for the anonymous counter store. When absent the
    /// server falls back to the in-process counter (single-instance only).
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default)]
    pub verify_action: VerifyActionSettings,

    /// Subscription tier per subject id, used to seed the built-in profile
    /// store. Stands in for the external user-profile service; subjects not
    /// listed here default to the free tier.
    #[serde(default)]
    pub tiers: HashMap<String, Tier>,
}

fn default_anonymous_daily_limit() -> u64 {
    5
}

impl Default for QuotaSettings {
    fn default() -> Self {
        QuotaSettings {
            tier_limits: TierLimits::default(),
            anonymous_daily_limit: default_anonymous_daily_limit(),
            redis_url: None,
            verify_action: VerifyActionSettings::default(),
            tiers: HashMap::new(),
        }
    }
}

impl QuotaSettings {
    pub fn validate(&self) -> Result<(), QuotaValidationError> {
        self.tier_limits.validate()?;
        self.verify_action.validate()?;

        if self.anonymous_daily_limit == 0 {
            return Err(QuotaValidationError {
                message: "anonymous_daily_limit must be greater than 0".to_string(),
            });
        }

        // The anonymous limit is the floor of the whole policy.
        if self.anonymous_daily_limit > self.tier_limits.free {
            return Err(QuotaValidationError {
                message: format!(
                    "anonymous_daily_limit ({}) must not exceed the free tier limit ({})",
                    self.anonymous_daily_limit, self.tier_limits.free
                ),
            });
        }

        Ok(())
    }
}
