use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uiact_core_types::{ExecMode, PatternKey};

/// Ring capacity for per-key recent outcomes.
pub const RECENT_CAP: usize = 20;

/// Store configuration.
#[derive(Clone, Debug, Default)]
pub struct StoreCfg {
    /// Append log location; `None` keeps the store purely in memory.
    pub path: Option<PathBuf>,
}

impl StoreCfg {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

/// One observed attempt outcome, as handed to the store.
#[derive(Clone, Copy, Debug)]
pub struct Outcome {
    pub success: bool,
    pub duration: Duration,
}

impl Outcome {
    pub fn success(duration: Duration) -> Self {
        Self {
            success: true,
            duration,
        }
    }

    pub fn failure(duration: Duration) -> Self {
        Self {
            success: false,
            duration,
        }
    }
}

/// Ring entry kept per key, newest first.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RecentOutcome {
    pub success: bool,
    pub duration_ms: u64,
    pub at: DateTime<Utc>,
}

/// Per-key aggregate. Counters persist for the life of the key; only the
/// ring ages out.
#[derive(Clone, Debug, Default)]
pub struct PatternRecord {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub recent_outcomes: VecDeque<RecentOutcome>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl PatternRecord {
    pub(crate) fn apply(&mut self, sample: RecentOutcome) {
        self.attempts += 1;
        if sample.success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.recent_outcomes.push_front(sample);
        while self.recent_outcomes.len() > RECENT_CAP {
            self.recent_outcomes.pop_back();
        }
        self.last_updated = Some(sample.at);
    }
}

/// Self-contained persisted record, one JSON line per outcome. The log is
/// the durable ground truth; aggregates are rebuilt from it at load time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutcomeLine {
    pub pattern_key: PatternKey,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub duration_ms: u64,
    pub driver: ExecMode,
}

impl OutcomeLine {
    pub fn new(key: &PatternKey, outcome: Outcome, at: DateTime<Utc>) -> Self {
        Self {
            pattern_key: key.clone(),
            timestamp: at,
            success: outcome.success,
            duration_ms: outcome.duration.as_millis() as u64,
            driver: key.driver,
        }
    }

    pub(crate) fn sample(&self) -> RecentOutcome {
        RecentOutcome {
            success: self.success,
            duration_ms: self.duration_ms,
            at: self.timestamp,
        }
    }
}
