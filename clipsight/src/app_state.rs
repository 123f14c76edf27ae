use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use clipsight_core::quota::period;
use clipsight_core::quota::tier::Tier;

use crate::services::quota::anonymous::{AnonymousCounter, MemoryCounter, RedisCounter};
use crate::services::quota::profile::{MemoryProfileStore, QuotaRecord};
use crate::services::quota::window::WindowLimiter;
use crate::services::quota::AdmissionService;
use crate::settings::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub admission: Arc<AdmissionService>,
    pub verify_limiter: Arc<WindowLimiter>,
    /// Built-in stand-in for the external user-profile service, seeded from
    /// configuration. Exposed so tests can arrange records directly.
    pub profiles: MemoryProfileStore,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub async fn new() -> anyhow::Result<SharedAppState> {
        let settings = Settings::new()?;
        Ok(Self::from_settings(settings).await)
    }

    pub fn new_for_config_only() -> anyhow::Result<SharedAppState> {
        let settings = Settings::new()?;
        Ok(Arc::new(AppState {
            settings: settings.clone(),
            admission: Arc::new(AdmissionService::new(
                settings.quota,
                Arc::new(MemoryProfileStore::new()),
                Arc::new(MemoryCounter::new()),
            )),
            verify_limiter: Arc::new(WindowLimiter::new()),
            profiles: MemoryProfileStore::new(),
        }))
    }

    pub async fn from_settings(settings: Settings) -> SharedAppState {
        let anonymous: Arc<dyn AnonymousCounter> = match settings.quota.redis_url.as_deref() {
            Some(url) => match RedisCounter::new(url) {
                Ok(counter) => Arc::new(counter),
                Err(e) => {
                    warn!("Failed to set up redis counter ({e}), using in-process counter");
                    Arc::new(MemoryCounter::new())
                }
            },
            None => Arc::new(MemoryCounter::new()),
        };

        let profiles = MemoryProfileStore::new();
        let today = period::day_stamp(Utc::now());
        for subject_id in settings.api.api_keys.keys() {
            let tier = settings
                .quota
                .tiers
                .get(subject_id)
                .copied()
                .unwrap_or(Tier::Free);
            profiles
                .insert(subject_id, QuotaRecord::new(tier, &today))
                .await;
        }

        let admission = Arc::new(AdmissionService::new(
            settings.quota.clone(),
            Arc::new(profiles.clone()),
            anonymous,
        ));

        Arc::new(AppState {
            settings,
            admission,
            verify_limiter: Arc::new(WindowLimiter::new()),
            profiles,
        })
    }
}
