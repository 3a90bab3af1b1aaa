//! Retry pacing for rate-limited or failed requests.
//!
//! Delays grow exponentially from `base` and are capped at `max`. With jitter
//! enabled the delay is drawn uniformly from the upper half of the window
//! (`[d/2, d]`), so consecutive clients do not retry in lockstep.

use std::time::Duration;

use rand::Rng;

/// Default first back-off delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default upper bound for a single back-off delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_DELAY,
            max: DEFAULT_MAX_DELAY,
            max_retries: 5,
            jitter: true,
        }
    }
}

impl BackoffPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Policy that never sleeps; used where pacing is irrelevant.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            base: Duration::ZERO,
            max: Duration::ZERO,
            max_retries,
            jitter: false,
        }
    }

    /// Uncapped-by-jitter delay for retry number `attempt` (0-based):
    /// `base * 2^attempt`, capped at `max`.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Delay before retry number `attempt`.
    ///
    /// A server-provided `retry_after` wins when it is longer than the
    /// computed delay, but never exceeds `max`.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        self.delay_with_rng(attempt, retry_after, &mut rand::thread_rng())
    }

    pub fn delay_with_rng<R: Rng + ?Sized>(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        rng: &mut R,
    ) -> Duration {
        let ceiling = self.ceiling(attempt);
        let computed = if self.jitter && !ceiling.is_zero() {
            let half = ceiling / 2;
            let spread = (ceiling - half).as_millis() as u64;
            half + Duration::from_millis(rng.gen_range(0..=spread))
        } else {
            ceiling
        };
        match retry_after {
            Some(server) if server > computed => server.min(self.max),
            _ => computed,
        }
    }
}
