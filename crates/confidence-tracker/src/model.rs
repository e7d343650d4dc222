use std::time::Duration;

use uiact_core_types::ExecMode;

/// Derived retry policy for one logical request. Never stored.
#[derive(Clone, Debug)]
pub struct RetryStrategy {
    pub max_retries: u8,
    /// One delay per retry, applied before that retry starts.
    pub backoff: Vec<Duration>,
    /// Switch to the process-isolated strategy from the second-to-last
    /// retry onward.
    pub escalate_driver: bool,
    pub recommended_driver: ExecMode,
}

impl RetryStrategy {
    /// Total attempts including the initial one.
    pub fn total_attempts(&self) -> u32 {
        u32::from(self.max_retries) + 1
    }
}

/// Tuning knobs for the tracker.
#[derive(Clone, Debug)]
pub struct TrackerCfg {
    /// Weight of outcome i (0 = newest) is `decay^i`.
    pub decay: f64,
    /// A driver needs this many recorded attempts before it can be
    /// recommended over the default.
    pub min_samples: u64,
    /// Hard ceiling on retries, bounding worst-case latency.
    pub max_retries_cap: u8,
    /// First backoff delay; subsequent delays double.
    pub base_backoff: Duration,
    /// Below this recency-weighted rate the executor self-protects toward
    /// the process-isolated path.
    pub escalate_below: f64,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            decay: 0.9,
            min_samples: 3,
            max_retries_cap: 3,
            base_backoff: Duration::from_millis(250),
            escalate_below: 0.5,
        }
    }
}
