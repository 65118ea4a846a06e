//! Session rate limiter.
//!
//! A fixed count plus the timestamp of the last success. The count never
//! decays: once `max_requests` is reached, only the gap since the most recent
//! success decides whether another send is allowed.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::error::RateLimitError;

/// Successful submissions in this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionWindow {
    pub count: u32,
    pub last_submitted_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_minutes: u64,
}

impl RateLimitPolicy {
    /// Window length; very large minute counts saturate instead of overflowing.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    window: SubmissionWindow,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            window: SubmissionWindow::default(),
        }
    }

    pub fn window(&self) -> SubmissionWindow {
        self.window
    }

    pub fn check_allowed(&self, now: Instant) -> bool {
        self.retry_after(now).is_none()
    }

    pub fn check(&self, now: Instant) -> Result<(), RateLimitError> {
        if self.check_allowed(now) {
            Ok(())
        } else {
            Err(RateLimitError {
                max_requests: self.policy.max_requests,
                window_minutes: self.policy.window_minutes,
            })
        }
    }

    /// Time left before a denied submission would be allowed again.
    pub fn retry_after(&self, now: Instant) -> Option<Duration> {
        if self.window.count < self.policy.max_requests {
            return None;
        }
        let last = self.window.last_submitted_at?;
        let elapsed = now.saturating_duration_since(last);
        self.policy.window().checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// Record a successful send.
    pub fn record_success(&mut self, now: Instant) {
        self.window.count = self.window.count.saturating_add(1);
        self.window.last_submitted_at = Some(now);
    }
}
