use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use clipsight_core::quota::identity::AnonymousKey;
use clipsight_core::quota::period;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter backend unavailable: {0}")]
    Unavailable(String),
}

/// Daily counter for anonymous callers.
///
/// `increment` must be a single atomic round trip against the backend: read
/// the current count, add one, and arm the expiry if the entry is new. Two
/// concurrent requests for the same key in the same period must never observe
/// the same pre-increment count.
#[async_trait]
pub trait AnonymousCounter: Send + Sync {
    async fn increment(
        &self,
        key: &AnonymousKey,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, CounterError>;
}

fn storage_key(key: &AnonymousKey, now: DateTime<Utc>) -> String {
    format!("anon:{}:{}", key, period::day_stamp(now))
}

/// Redis-backed counter, safe across multiple server instances.
///
/// The INCR + EXPIREAT pair runs as one Lua script so the whole
/// increment-with-expiry is a single atomic round trip.
pub struct RedisCounter {
    client: redis::Client,
}

impl RedisCounter {
    pub fn new(url: &str) -> Result<Self, CounterError> {
        let client =
            redis::Client::open(url).map_err(|e| CounterError::Unavailable(e.to_string()))?;
        info!("Anonymous quota counter using redis at {}", url);
        Ok(RedisCounter { client })
    }
}

const INCR_WITH_EXPIRY: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIREAT', KEYS[1], ARGV[1])
end
return current
"#;

#[async_trait]
impl AnonymousCounter for RedisCounter {
    async fn increment(
        &self,
        key: &AnonymousKey,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, CounterError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CounterError::Unavailable(e.to_string()))?;

        let script = redis::Script::new(INCR_WITH_EXPIRY);
        let count: u64 = script
            .key(storage_key(key, Utc::now()))
            .arg(expires_at.timestamp())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CounterError::Unavailable(e.to_string()))?;

        Ok(count)
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    count: u64,
    expires_at: DateTime<Utc>,
}

/// Process-local counter for single-instance deployments and tests.
/// Entries carry their expiry and are dropped lazily on access.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounter {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn increment_at(
        &self,
        key: &AnonymousKey,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> u64 {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);

        let entry = entries
            .entry(storage_key(key, now))
            .or_insert(MemoryEntry {
                count: 0,
                expires_at,
            });
        entry.count += 1;
        entry.count
    }
}

#[async_trait]
impl AnonymousCounter for MemoryCounter {
    async fn increment(
        &self,
        key: &AnonymousKey,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, CounterError> {
        Ok(self.increment_at(key, expires_at, Utc::now()).await)
    }
}

/// Test double that always reports the backend as unreachable.
#[cfg(test)]
pub struct UnavailableCounter;

#[cfg(test)]
#[async_trait]
impl AnonymousCounter for UnavailableCounter {
    async fn increment(
        &self,
        _key: &AnonymousKey,
        _expires_at: DateTime<Utc>,
    ) -> Result<u64, CounterError> {
        Err(CounterError::Unavailable("connection refused".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn memory_counter_counts_per_key() {
        let counter = MemoryCounter::new();
        let expires = Utc::now() + Duration::hours(1);

        let a = AnonymousKey::derive("192.168.1.1", None);
        let b = AnonymousKey::derive("192.168.1.1", Some("fp"));

        assert_eq!(counter.increment(&a, expires).await.unwrap(), 1);
        assert_eq!(counter.increment(&a, expires).await.unwrap(), 2);
        assert_eq!(counter.increment(&b, expires).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn memory_counter_expires_entries() {
        let counter = MemoryCounter::new();
        let now = Utc::now();
        let key = AnonymousKey::derive("10.0.0.1", None);

        let count = counter
            .increment_at(&key, now + Duration::seconds(10), now)
            .await;
        assert_eq!(count, 1);

        // Past the expiry the entry is gone and counting starts over.
        let later = now + Duration::seconds(11);
        let count = counter
            .increment_at(&key, later + Duration::seconds(10), later)
            .await;
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn concurrent_increments_observe_distinct_counts() {
        let counter = MemoryCounter::new();
        let expires = Utc::now() + Duration::hours(1);
        let key = AnonymousKey::derive("10.0.0.2", None);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let counter = counter.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                counter.increment(&key, expires).await.unwrap()
            }));
        }

        let mut counts = Vec::new();
        for handle in handles {
            counts.push(handle.await.unwrap());
        }
        counts.sort_unstable();
        assert_eq!(counts, (1..=16).collect::<Vec<u64>>());
    }
}
