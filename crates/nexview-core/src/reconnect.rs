// ── Reconnect delay policy ──
//
// Every retryable failure (bootstrap, transport, session invalidation)
// waits the same policy-defined delay before the next attempt. The
// default is a fixed delay with unlimited attempts; the capped
// exponential mode is opt-in.

use std::time::Duration;

/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Delay configuration for session reconnection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry, and every retry in fixed mode.
    pub delay: Duration,

    /// When set, the delay doubles per consecutive failure up to this
    /// cap, with +-25% spread. `None` keeps the delay fixed.
    pub max_delay: Option<Duration>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_delay: None,
        }
    }

    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            delay: initial,
            max_delay: Some(max),
        }
    }

    /// Delay before retry number `attempt` (0-based count of consecutive
    /// failures so far).
    ///
    /// Exponential mode: `delay = min(initial * 2^attempt, max) * jitter`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::as_conversions
    )]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let Some(max) = self.max_delay else {
            return self.delay;
        };

        let base = self.delay.as_secs_f64() * 2.0_f64.powi(attempt.min(30) as i32);
        let capped = base.min(max.as_secs_f64());

        // Deterministic spread seeded from the attempt number.
        let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
        Duration::from_secs_f64((capped * jitter_factor).max(0.0))
    }
}
