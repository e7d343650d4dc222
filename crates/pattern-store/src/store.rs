use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};
use uiact_core_types::PatternKey;

use crate::errors::StoreError;
use crate::log::{self, OutcomeLogHandle};
use crate::model::{Outcome, OutcomeLine, PatternRecord, StoreCfg};
use crate::replay;

/// Owner of all `PatternRecord`s. Callers only ever see cloned snapshots.
///
/// All mutation funnels through `record`; per-key updates take the shard
/// lock of the keyed map, so concurrent callers keep single-writer-per-key
/// semantics. The append log receives one self-contained line per outcome
/// and is replayed into aggregates on open.
pub struct PatternStore {
    records: DashMap<PatternKey, PatternRecord>,
    log: Option<OutcomeLogHandle>,
}

impl PatternStore {
    /// Open the store, replaying any persisted outcome log into aggregates.
    pub fn open(cfg: StoreCfg) -> Result<Self, StoreError> {
        let records = DashMap::new();
        let log = match cfg.path {
            Some(path) => {
                let lines = replay::read_all(&path)?;
                debug!(replayed = lines.len(), path = %path.display(), "pattern log replayed");
                for line in lines {
                    records
                        .entry(line.pattern_key.clone())
                        .or_insert_with(PatternRecord::default)
                        .apply(line.sample());
                }
                log::spawn(path)
            }
            None => None,
        };
        Ok(Self { records, log })
    }

    /// Purely in-memory store; nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            records: DashMap::new(),
            log: None,
        }
    }

    /// Record one attempt outcome for a key. Every call counts as one
    /// independent attempt; outcomes are never coalesced.
    pub fn record(&self, key: &PatternKey, outcome: Outcome) {
        let line = OutcomeLine::new(key, outcome, Utc::now());
        self.records
            .entry(key.clone())
            .or_insert_with(PatternRecord::default)
            .apply(line.sample());
        if let Some(log) = &self.log {
            if let Err(err) = log.append(line) {
                warn!(?err, key = %key, "failed to append outcome line");
            }
        }
    }

    /// Read-only snapshot of one key's aggregate.
    pub fn snapshot(&self, key: &PatternKey) -> Option<PatternRecord> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    pub fn keys(&self) -> Vec<PatternKey> {
        self.records.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Force the append log to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        match &self.log {
            Some(log) => log.flush().map_err(StoreError::Io),
            None => Ok(()),
        }
    }
}
