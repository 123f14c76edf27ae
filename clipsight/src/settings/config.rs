use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use clipsight_core::settings::{api_server::ApiServer, quota::QuotaSettings};

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub api: ApiServer,
    #[serde(default)]
    pub quota: QuotaSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug: false,
            api: ApiServer::default(),
            quota: QuotaSettings::default(),
        }
    }
}

impl Settings {
    pub fn get_environment() -> Environment {
        Environment::default()
            .prefix("CLIPSIGHT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("CLIPSIGHT_RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("debug", false)?
            .set_default("api.bind_address", "0.0.0.0:8412")?
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Self::get_environment());

        let s = builder.build()?;

        let settings: Settings = s.try_deserialize()?;

        settings
            .quota
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsight_core::quota::tier::Tier;

    #[test]
    fn quota_settings_from_env() {
        env::set_var("CLIPSIGHT__QUOTA__TIER_LIMITS__STARTER", "250");
        env::set_var("CLIPSIGHT__QUOTA__ANONYMOUS_DAILY_LIMIT", "3");

        let settings: Settings = Config::builder()
            .add_source(Settings::get_environment())
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        env::remove_var("CLIPSIGHT__QUOTA__TIER_LIMITS__STARTER");
        env::remove_var("CLIPSIGHT__QUOTA__ANONYMOUS_DAILY_LIMIT");

        assert_eq!(settings.quota.tier_limits.limit_for(Tier::Starter), 250);
        assert_eq!(settings.quota.anonymous_daily_limit, 3);
        // untouched tiers keep their reference defaults
        assert_eq!(settings.quota.tier_limits.limit_for(Tier::Enterprise), 2000);
    }

    #[test]
    fn invalid_tier_order_fails_validation() {
        let settings = Settings {
            quota: QuotaSettings {
                tier_limits: clipsight_core::settings::quota::TierLimits {
                    free: 500,
                    starter: 100,
                    pro: 500,
                    enterprise: 2000,
                },
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.quota.validate().is_err());
    }
}
