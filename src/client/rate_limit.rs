//! Reactive per-resource throttling for the LogicMonitor API
//!
//! LogicMonitor applies rate limits per endpoint. A throttle for a resource path
//! stays dormant until that path answers 429; from then on every request to it
//! waits for a token bucket slot. Paths that never hit the limit are not slowed.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use tokio::sync::RwLock;

/// Throttle state for a single resource path.
pub struct PathThrottle {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
    resource_path: String,
}

impl PathThrottle {
    /// Create a dormant throttle allowing `per_second` requests once active.
    pub fn new(resource_path: &str, per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: RateLimiter::direct(quota),
            active: AtomicBool::new(false),
            resource_path: resource_path.to_string(),
        }
    }

    /// Activate throttling for this path.
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!("Throttling activated for {}", self.resource_path);
        }
    }

    /// Check if throttling is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for a slot if throttling is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            debug!("Waiting for throttle on {}", self.resource_path);
            self.limiter.until_ready().await;
        }
    }
}

/// Lazily populated throttles keyed by resource path.
pub struct ThrottleSet {
    per_second: u32,
    throttles: RwLock<HashMap<String, Arc<PathThrottle>>>,
}

impl ThrottleSet {
    pub fn new(per_second: u32) -> Self {
        Self {
            per_second,
            throttles: RwLock::new(HashMap::new()),
        }
    }

    /// Wait for permission on `resource_path` (only if it was rate limited before).
    pub async fn wait_for(&self, resource_path: &str) {
        let throttle = {
            let throttles = self.throttles.read().await;
            throttles.get(resource_path).cloned()
        };
        if let Some(throttle) = throttle {
            throttle.wait_if_active().await;
        }
    }

    /// Activate throttling for `resource_path` (called on 429).
    pub async fn activate(&self, resource_path: &str) {
        let mut throttles = self.throttles.write().await;
        throttles
            .entry(resource_path.to_string())
            .or_insert_with(|| Arc::new(PathThrottle::new(resource_path, self.per_second)))
            .activate();
    }

    /// Whether `resource_path` is currently throttled.
    pub async fn is_active(&self, resource_path: &str) -> bool {
        let throttles = self.throttles.read().await;
        throttles
            .get(resource_path)
            .map(|t| t.is_active())
            .unwrap_or(false)
    }
}
