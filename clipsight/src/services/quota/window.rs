use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for the window limiter, injected so tests can drive the clock
/// instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct WindowEntry {
    count: u32,
    window_expires_at: Instant,
}

/// Fixed-window limiter for a single sensitive action.
///
/// Guards credential verification at a handful of calls per hour per
/// identity, independent of the daily quotas. Fixed windows (full reset at
/// the boundary, no sliding) are acceptable here because the action is
/// low-frequency and not revenue-critical.
///
/// State is process-local: with several server instances a caller can exceed
/// the intended global limit by spreading requests across instances. Known
/// single-instance limitation.
pub struct WindowLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    clock: Arc<dyn Clock>,
}

impl WindowLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        WindowLimiter {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Admit or reject one call for `key`. A fresh or expired window starts
    /// at count 1 and is always admitted.
    pub fn allow(&self, key: &str, max_per_window: u32, window: Duration) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("window limiter lock poisoned");

        match entries.get_mut(key) {
            Some(entry) if now < entry.window_expires_at => {
                if entry.count < max_per_window {
                    entry.count += 1;
                    true
                } else {
                    false
                }
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    WindowEntry {
                        count: 1,
                        window_expires_at: now + window,
                    },
                );
                true
            }
        }
    }
}

impl Default for WindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}
