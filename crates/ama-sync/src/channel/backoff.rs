//! Reconnect backoff
//!
//! Linear: the first retry waits `initial`, every further one adds `step`, capped at
//! `max`. A random jitter of up to `jitter` (fraction of the delay) is added so that
//! clients dropped together do not reconnect in lockstep.

use rand::Rng;
use std::time::Duration;

use ama_common::LiveConfig;

/// Reconnect delay policy
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub step: Duration,
    pub max: Duration,
    /// Fraction of the delay added as random jitter, in `0.0..=1.0`
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            step: Duration::from_secs(1),
            max: Duration::from_secs(5),
            jitter: 0.2,
        }
    }
}

impl From<&LiveConfig> for ReconnectPolicy {
    fn from(config: &LiveConfig) -> Self {
        Self {
            initial: config.reconnect_initial(),
            max: config.reconnect_max(),
            ..Self::default()
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Immediate retries, for tests
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            initial: Duration::ZERO,
            step: Duration::ZERO,
            max: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Delay before the given retry (1-based), without jitter
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let extra = self.step.saturating_mul(attempt.saturating_sub(1));
        std::cmp::min(self.initial.saturating_add(extra), self.max)
    }

    /// Delay before the given retry (1-based), jitter included
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let factor = rand::thread_rng().gen_range(0.0..=self.jitter);
        base + base.mul_f64(factor)
    }
}
