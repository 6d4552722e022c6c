use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::GatewayError;

/// Default admission budget: 5 calls per 60-second window per address.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 5;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

struct WindowCounter {
    count: u32,
    window_started: Instant,
}

/// Fixed-window rate limiter keyed by source address. Windows are anchored
/// at the first call of an empty window and expire lazily; a rejected call
/// does not consume budget.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<HashMap<String, WindowCounter>>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW)
    }

    pub fn with_limits(limit: u32, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            limit,
            window,
        }
    }

    pub fn check(&self, address: &str) -> Result<(), GatewayError> {
        self.check_at(address, Instant::now())
    }

    /// Clock-injected variant of `check` so tests can drive the window.
    pub fn check_at(&self, address: &str, now: Instant) -> Result<(), GatewayError> {
        let mut state = self.state.lock().expect("rate limit lock");

        match state.get_mut(address) {
            Some(counter) if now.duration_since(counter.window_started) < self.window => {
                if counter.count >= self.limit {
                    return Err(GatewayError::RateLimited);
                }
                counter.count += 1;
                Ok(())
            }
            // Counter absent or past its window: start a fresh window with
            // this call as its first admission.
            _ => {
                state.insert(
                    address.to_string(),
                    WindowCounter {
                        count: 1,
                        window_started: now,
                    },
                );
                Ok(())
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixth_call_in_window_rejected() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for n in 0..5 {
            let at = start + Duration::from_secs(n);
            assert!(limiter.check_at("10.0.0.1", at).is_ok(), "call {n}");
        }

        assert!(matches!(
            limiter.check_at("10.0.0.1", start + Duration::from_secs(10)),
            Err(GatewayError::RateLimited)
        ));
    }

    #[test]
    fn test_window_expires_from_first_call() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..5 {
            limiter.check_at("10.0.0.1", start).unwrap();
        }
        assert!(limiter
            .check_at("10.0.0.1", start + Duration::from_secs(59))
            .is_err());

        // 60 seconds after the first call the window is empty again.
        assert!(limiter
            .check_at("10.0.0.1", start + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn test_rejected_calls_do_not_extend_the_window() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..5 {
            limiter.check_at("10.0.0.1", start).unwrap();
        }

        // Hammering while limited must not push the expiry forward.
        for n in 1..60 {
            let at = start + Duration::from_secs(n);
            assert!(limiter.check_at("10.0.0.1", at).is_err());
        }

        assert!(limiter
            .check_at("10.0.0.1", start + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..5 {
            limiter.check_at("10.0.0.1", start).unwrap();
        }
        assert!(limiter.check_at("10.0.0.1", start).is_err());
        assert!(limiter.check_at("10.0.0.2", start).is_ok());
    }
}
