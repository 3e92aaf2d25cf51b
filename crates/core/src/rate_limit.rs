//! Fixed-window rate limiting for access-code attempts.
//!
//! State is an in-memory map from key to `{count, window_reset_at}` behind a
//! mutex. It is per-process only: a coarse abuse deterrent, not a
//! correctness mechanism. Keys combine the action name with a
//! client-identifying attribute (see [`rate_limit_key`]) so different
//! actions never share a budget.
//!
//! The number of tracked keys is capped. Once full, expired windows are
//! swept, and if that frees nothing a new key is denied outright. Callers
//! that can invent keys therefore cannot grow the map without bound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default number of attempts allowed per window.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Default cap on distinct keys held at once.
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

/// Source of monotonic time for the limiter.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Limiter settings.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
    pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            max_tracked_keys: DEFAULT_MAX_TRACKED_KEYS,
        }
    }
}

/// Outcome of a [`RateLimiter::check`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Attempts left in the current window after this call.
    pub remaining: u32,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Thread-safe fixed-window counter keyed by string.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, Window>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a limiter driven by the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter driven by the given clock.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Record an attempt for `key` and report whether it is within budget.
    ///
    /// An expired (or absent) window restarts at a count of 1. Otherwise the
    /// count is incremented and compared against the cap, so the
    /// `max_attempts + 1`-th call inside one window is denied.
    ///
    /// A key not yet tracked is denied while the limiter is full of live
    /// windows.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if !windows.contains_key(key) && windows.len() >= self.config.max_tracked_keys {
            windows.retain(|_, w| w.reset_at > now);
            if windows.len() >= self.config.max_tracked_keys {
                tracing::warn!(key, tracked = windows.len(), "Rate limiter full, denying new key");
                return RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                };
            }
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now,
        });

        if now >= window.reset_at {
            window.count = 1;
            window.reset_at = now + self.config.window;
        } else {
            window.count = window.count.saturating_add(1);
        }

        let allowed = window.count <= self.config.max_attempts;
        let remaining = self.config.max_attempts.saturating_sub(window.count);

        if !allowed {
            tracing::warn!(key, count = window.count, "Rate limit exceeded");
        }

        RateLimitDecision { allowed, remaining }
    }
}

/// Build a limiter key from an action name and client identity.
pub fn rate_limit_key(action: &str, client: &str) -> String {
    format!("{action}:{client}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Manually advanced clock for deterministic window tests.
    struct TestClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl TestClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    fn limiter(clock: Arc<TestClock>) -> RateLimiter {
        RateLimiter::with_clock(
            RateLimitConfig {
                max_attempts: 3,
                window: Duration::from_secs(60),
                ..Default::default()
            },
            clock,
        )
    }

    #[test]
    fn allows_up_to_cap_then_denies() {
        let limiter = limiter(TestClock::new());

        let first = limiter.check("k");
        assert!(first.allowed);
        assert_eq!(first.remaining, 2);

        assert!(limiter.check("k").allowed);
        let third = limiter.check("k");
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);

        let fourth = limiter.check("k");
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);
    }

    #[test]
    fn fresh_window_allows_again() {
        let clock = TestClock::new();
        let limiter = limiter(Arc::clone(&clock));

        for _ in 0..4 {
            limiter.check("k");
        }
        assert!(!limiter.check("k").allowed);

        clock.advance(Duration::from_secs(60));
        let decision = limiter.check("k");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn window_does_not_reset_early() {
        let clock = TestClock::new();
        let limiter = limiter(Arc::clone(&clock));

        for _ in 0..3 {
            limiter.check("k");
        }
        clock.advance(Duration::from_secs(59));
        assert!(!limiter.check("k").allowed);
    }

    #[test]
    fn keys_have_independent_budgets() {
        let limiter = limiter(TestClock::new());
        for _ in 0..4 {
            limiter.check(&rate_limit_key("access_code", "10.0.0.1"));
        }
        assert!(limiter.check(&rate_limit_key("access_code", "10.0.0.2")).allowed);
        assert!(limiter.check(&rate_limit_key("login", "10.0.0.1")).allowed);
    }

    #[test]
    fn key_combines_action_and_client() {
        assert_eq!(rate_limit_key("access_code", "1.2.3.4"), "access_code:1.2.3.4");
    }

    #[test]
    fn full_limiter_denies_new_keys_until_windows_expire() {
        let clock = TestClock::new();
        let limiter = RateLimiter::with_clock(
            RateLimitConfig {
                max_attempts: 3,
                window: Duration::from_secs(60),
                max_tracked_keys: 2,
            },
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        assert!(limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
        let third = limiter.check("c");
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);

        // Keys already tracked keep their own budget.
        assert!(limiter.check("a").allowed);

        clock.advance(Duration::from_secs(60));
        assert!(limiter.check("c").allowed);
    }

    #[test]
    fn concurrent_checks_are_counted_exactly() {
        let limiter = Arc::new(RateLimiter::with_clock(
            RateLimitConfig {
                max_attempts: 50,
                window: Duration::from_secs(60),
                ..Default::default()
            },
            TestClock::new(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..10).filter(|_| limiter.check("shared").allowed).count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }
}
