//! Pacing between downloads and the wall-clock used for the run budget.
//!
//! Both sit behind traits so tests can observe delays without waiting for them.

use std::time::{Duration, Instant};

use rand::Rng;

/// Base delay plus a bounded random jitter, applied before each download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max_jitter: Duration,
}

impl BackoffPolicy {
    pub const NONE: BackoffPolicy = BackoffPolicy {
        base: Duration::ZERO,
        max_jitter: Duration::ZERO,
    };

    /// Builds a policy from a user-supplied delay; non-positive or non-finite
    /// delays disable pacing altogether, and delays too large for a `Duration`
    /// saturate.
    pub fn from_seconds(delay_seconds: f64, max_jitter: Duration) -> Self {
        if !delay_seconds.is_finite() || delay_seconds <= 0.0 {
            return Self::NONE;
        }
        Self {
            base: Duration::try_from_secs_f64(delay_seconds).unwrap_or(Duration::MAX),
            max_jitter,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.base.is_zero() && self.max_jitter.is_zero()
    }

    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base;
        }
        self.base
            .saturating_add(Duration::from_millis(rng.gen_range(0..=jitter_ms)))
    }
}

#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Monotonic time elapsed since an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn zero_or_invalid_delay_disables_pacing() {
        let jitter = Duration::from_millis(500);
        assert!(BackoffPolicy::from_seconds(0.0, jitter).is_disabled());
        assert!(BackoffPolicy::from_seconds(-1.0, jitter).is_disabled());
        assert!(BackoffPolicy::from_seconds(f64::NAN, jitter).is_disabled());
    }

    #[test]
    fn huge_delay_saturates_instead_of_panicking() {
        let policy = BackoffPolicy::from_seconds(1e20, Duration::from_millis(500));
        assert_eq!(policy.base, Duration::MAX);
        let mut rng = StepRng::new(7, 3);
        assert_eq!(policy.next_delay(&mut rng), Duration::MAX);
    }

    #[test]
    fn delay_stays_within_jitter_bound() {
        let policy = BackoffPolicy::from_seconds(2.0, Duration::from_millis(1500));
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let delay = policy.next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_millis(3500));
        }
    }

    #[test]
    fn no_jitter_returns_base() {
        let policy = BackoffPolicy::from_seconds(1.5, Duration::ZERO);
        let mut rng = StepRng::new(7, 3);
        assert_eq!(policy.next_delay(&mut rng), Duration::from_millis(1500));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
