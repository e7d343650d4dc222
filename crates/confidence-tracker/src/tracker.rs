use std::sync::Arc;
use std::time::Duration;

use pattern_store::{PatternRecord, PatternStore};
use rand::Rng;
use tracing::debug;
use uiact_core_types::{ActionKind, ExecMode, PatternKey};

use crate::model::{RetryStrategy, TrackerCfg};

/// Derives driver recommendations and retry policy from recorded history.
///
/// This is the single scoring system in the engine; success rates computed
/// here are recency-weighted so a run of recent failures drags a previously
/// reliable driver down without erasing long-run counters.
pub struct ConfidenceTracker {
    store: Arc<PatternStore>,
    cfg: TrackerCfg,
}

impl ConfidenceTracker {
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self::with_cfg(store, TrackerCfg::default())
    }

    pub fn with_cfg(store: Arc<PatternStore>, cfg: TrackerCfg) -> Self {
        Self { store, cfg }
    }

    /// Recency-weighted success rate over the key's ring buffer, or `None`
    /// when nothing has been observed yet.
    pub fn success_rate(&self, key: &PatternKey) -> Option<f64> {
        self.store
            .snapshot(key)
            .and_then(|record| self.weighted_rate(&record))
    }

    /// Driver with the best recency-weighted rate among those with at least
    /// `min_samples` attempts; the safest mode when no history qualifies.
    pub fn recommend_driver(&self, action_kind: ActionKind, platform: &str) -> ExecMode {
        let mut best: Option<(ExecMode, f64)> = None;
        for mode in ExecMode::ALL {
            let key = PatternKey::new(action_kind, platform, mode);
            let Some(record) = self.store.snapshot(&key) else {
                continue;
            };
            if record.attempts < self.cfg.min_samples {
                continue;
            }
            let Some(rate) = self.weighted_rate(&record) else {
                continue;
            };
            if best.map(|(_, current)| rate > current).unwrap_or(true) {
                best = Some((mode, rate));
            }
        }
        match best {
            Some((mode, rate)) => {
                debug!(driver = %mode, rate, "recommending driver from history");
                mode
            }
            None => ExecMode::Subprocess,
        }
    }

    /// Derive the retry policy for a request: low reliability buys more
    /// retries (bounded by the hard cap) and an escalation to the
    /// process-isolated path.
    pub fn build_retry_strategy(&self, action_kind: ActionKind, platform: &str) -> RetryStrategy {
        let recommended = self.recommend_driver(action_kind, platform);
        let rate = self.success_rate(&PatternKey::new(action_kind, platform, recommended));

        let max_retries = match rate {
            Some(rate) if rate >= 0.8 => 1,
            Some(rate) if rate >= 0.5 => 2,
            Some(_) => self.cfg.max_retries_cap,
            None => 2,
        }
        .min(self.cfg.max_retries_cap);

        let escalate_driver = rate.map(|r| r < self.cfg.escalate_below).unwrap_or(false);

        RetryStrategy {
            max_retries,
            backoff: self.backoff_schedule(max_retries),
            escalate_driver,
            recommended_driver: recommended,
        }
    }

    fn backoff_schedule(&self, retries: u8) -> Vec<Duration> {
        let base_ms = self.cfg.base_backoff.as_millis() as u64;
        let mut rng = rand::thread_rng();
        (0..retries)
            .map(|i| {
                let step = base_ms.saturating_mul(1 << u32::from(i));
                let jitter = rng.gen_range(0..=base_ms / 2);
                Duration::from_millis(step + jitter)
            })
            .collect()
    }

    fn weighted_rate(&self, record: &PatternRecord) -> Option<f64> {
        if record.recent_outcomes.is_empty() {
            return None;
        }
        let mut weighted_success = 0.0;
        let mut weighted_total = 0.0;
        let mut weight = 1.0;
        for outcome in &record.recent_outcomes {
            weighted_total += weight;
            if outcome.success {
                weighted_success += weight;
            }
            weight *= self.cfg.decay;
        }
        Some(weighted_success / weighted_total)
    }
}
