//! Exponential backoff schedule.
//!
//! Only the resumable-upload sub-protocol retries on its own; everything else
//! surfaces failures to the caller. The schedule is deterministic (no jitter):
//! `initial_delay_ms * multiplier^retry`.

use serde::{Deserialize, Serialize};

/// Default number of attempts per upload chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
/// Default growth factor between retries.
pub const DEFAULT_MULTIPLIER: u32 = 2;

/// Backoff parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backoff {
    /// Maximum number of attempts.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after each retry.
    pub multiplier: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl Backoff {
    /// Delay to wait after the `retry`-th failed attempt (zero-based).
    #[must_use]
    pub fn delay_ms(&self, retry: u32) -> u64 {
        let factor = u64::from(self.multiplier).saturating_pow(retry);
        self.initial_delay_ms.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles() {
        let b = Backoff::default();
        assert_eq!(b.delay_ms(0), 1000);
        assert_eq!(b.delay_ms(1), 2000);
        assert_eq!(b.delay_ms(2), 4000);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let b = Backoff {
            max_retries: 100,
            initial_delay_ms: u64::MAX / 2,
            multiplier: 10,
        };
        assert_eq!(b.delay_ms(50), u64::MAX);
    }
}
