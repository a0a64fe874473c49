//! Per-visitor request spacing.
//!
//! Every attempt is recorded, including refused ones, so a visitor who keeps
//! asking inside the window stays limited until they pause for a full
//! interval. Entries older than one interval carry no information and are
//! dropped on the next check.

use std::collections::HashMap;
use std::time::Duration;

use ekk0_core::types::VisitorId;
use parking_lot::Mutex;
use tokio::time::Instant;

/// Allows one commentary call per visitor per `interval`.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Mutex<HashMap<VisitorId, Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given spacing.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt by `visitor` and report whether it may proceed.
    ///
    /// Returns `Err` with the time left when the previous attempt was less
    /// than one interval ago.
    pub fn check(&self, visitor: &VisitorId) -> Result<(), Duration> {
        let now = Instant::now();
        let mut last_request = self.last_request.lock();
        last_request.retain(|_, at| now.duration_since(*at) < self.interval);
        let previous = last_request.insert(visitor.clone(), now);
        match previous {
            Some(at) if now.duration_since(at) < self.interval => {
                Err(self.interval - now.duration_since(at))
            }
            _ => Ok(()),
        }
    }

    /// Number of visitors limited right now.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.last_request.lock().len()
    }
}
