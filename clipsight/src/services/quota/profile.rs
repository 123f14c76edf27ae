use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use clipsight_core::quota::tier::Tier;

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("no profile record for user {0}")]
    NotFound(String),

    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Quota fields of a user profile, owned by the external profile store.
/// Mutated only through [`UserProfileStore::record_usage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaRecord {
    pub tier: Tier,
    /// Requests counted against the current period.
    pub daily_requests: u64,
    /// Period marker: the `YYYY-MM-DD` day the counter belongs to.
    pub last_request_date: String,
}

impl QuotaRecord {
    pub fn new(tier: Tier, today: &str) -> Self {
        QuotaRecord {
            tier,
            daily_requests: 0,
            last_request_date: today.to_string(),
        }
    }
}

/// Post-increment view returned by [`UserProfileStore::record_usage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub tier: Tier,
    pub daily_requests: u64,
}

/// Seam to the user-profile collaborator that owns the persisted quota
/// fields. The admission service only ever reads records and records usage;
/// profile CRUD belongs to another part of the system.
#[async_trait]
pub trait UserProfileStore: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<QuotaRecord, ProfileStoreError>;

    /// Atomically reset the counter if `today` differs from the stored period
    /// marker, then increment it by one. Implementations must perform the
    /// reset and the increment as a single conditional update so that two
    /// racing requests at a day boundary cannot double-reset or lose counts.
    async fn record_usage(
        &self,
        user_id: &str,
        today: &str,
    ) -> Result<UsageSnapshot, ProfileStoreError>;
}

/// In-memory profile store. One lock guards the whole map, which makes
/// `record_usage` the atomic reset-then-increment the trait demands.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    records: Arc<RwLock<HashMap<String, QuotaRecord>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: &str, record: QuotaRecord) {
        self.records
            .write()
            .await
            .insert(user_id.to_string(), record);
    }

    pub async fn get(&self, user_id: &str) -> Option<QuotaRecord> {
        self.records.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl UserProfileStore for MemoryProfileStore {
    async fn fetch(&self, user_id: &str) -> Result<QuotaRecord, ProfileStoreError> {
        self.records
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProfileStoreError::NotFound(user_id.to_string()))
    }

    async fn record_usage(
        &self,
        user_id: &str,
        today: &str,
    ) -> Result<UsageSnapshot, ProfileStoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(user_id)
            .ok_or_else(|| ProfileStoreError::NotFound(user_id.to_string()))?;

        if record.last_request_date != today {
            record.daily_requests = 0;
            record.last_request_date = today.to_string();
        }
        record.daily_requests += 1;

        Ok(UsageSnapshot {
            tier: record.tier,
            daily_requests: record.daily_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_usage_increments_same_day() {
        let store = MemoryProfileStore::new();
        store
            .insert("u1", QuotaRecord::new(Tier::Starter, "2024-03-14"))
            .await;

        let first = store.record_usage("u1", "2024-03-14").await.unwrap();
        let second = store.record_usage("u1", "2024-03-14").await.unwrap();
        assert_eq!(first.daily_requests, 1);
        assert_eq!(second.daily_requests, 2);
        assert_eq!(second.tier, Tier::Starter);
    }

    #[tokio::test]
    async fn record_usage_resets_on_new_day() {
        let store = MemoryProfileStore::new();
        store
            .insert(
                "u1",
                QuotaRecord {
                    tier: Tier::Free,
                    daily_requests: 5,
                    last_request_date: "2024-03-14".to_string(),
                },
            )
            .await;

        let snapshot = store.record_usage("u1", "2024-03-15").await.unwrap();
        assert_eq!(snapshot.daily_requests, 1);

        let record = store.get("u1").await.unwrap();
        assert_eq!(record.last_request_date, "2024-03-15");
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let store = MemoryProfileStore::new();
        assert!(matches!(
            store.fetch("ghost").await,
            Err(ProfileStoreError::NotFound(_))
        ));
        assert!(matches!(
            store.record_usage("ghost", "2024-03-14").await,
            Err(ProfileStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_usage_never_undercounts() {
        let store = MemoryProfileStore::new();
        store
            .insert("u1", QuotaRecord::new(Tier::Pro, "2024-03-14"))
            .await;

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.record_usage("u1", "2024-03-14").await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = store.get("u1").await.unwrap();
        assert_eq!(record.daily_requests, 32);
    }
}
