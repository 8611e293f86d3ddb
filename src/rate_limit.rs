//! Global cooldown between WHOIS invocations.
//!
//! Registries throttle or ban clients that query too fast, so every tool
//! call passes through one shared `RateLimiter` before the client is spawned.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between consecutive callers.
///
/// The last-call instant is read and updated under one async lock that is
/// held across the wait, so overlapping callers are served one at a time in
/// lock-acquisition order.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// caller returned, then record now as the last call.
    ///
    /// Returns how long this caller was suspended.
    pub async fn throttle(&self) -> Duration {
        let mut last_call = self.last_call.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval - elapsed;
                tracing::debug!(wait_ms = %waited.as_millis(), "rate limiter delaying whois query");
                tokio::time::sleep(waited).await;
            }
        }

        *last_call = Some(Instant::now());
        waited
    }
}
