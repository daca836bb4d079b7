use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Backoff applied by a watcher before it re-issues a long-poll that ended
/// with a service or parse error
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct WatchPolicy {
    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl WatchPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(invalid(format!(
                "watch base delay {}ms exceeds max delay {}ms",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Exponential delay for the given consecutive failure count, capped at
    /// `max_delay_ms`, with up to 10% random jitter added.
    pub(crate) fn backoff(
        &self,
        attempts: usize,
    ) -> Duration {
        use rand::Rng;

        let exp = attempts.saturating_sub(1).min(16) as u32;
        let delay = self.base_delay_ms.saturating_mul(1u64 << exp).min(self.max_delay_ms);
        let jitter = if delay >= 10 {
            rand::thread_rng().gen_range(0..=delay / 10)
        } else {
            0
        };
        Duration::from_millis(delay + jitter)
    }
}

fn default_base_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    5000
}
