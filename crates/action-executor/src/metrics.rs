use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lightweight counters for one executor instance.
#[derive(Clone, Default)]
pub struct ExecMetrics {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    succeeded: AtomicU64,
    failed: AtomicU64,
    attempts: AtomicU64,
    escalations: AtomicU64,
    lease_conflicts: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MetricsSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub attempts: u64,
    pub escalations: u64,
    pub lease_conflicts: u64,
}

impl ExecMetrics {
    pub fn record_attempt(&self) {
        self.inner.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_escalation(&self) {
        self.inner.escalations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.inner.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lease_conflict(&self) {
        self.inner.lease_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            succeeded: self.inner.succeeded.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            attempts: self.inner.attempts.load(Ordering::Relaxed),
            escalations: self.inner.escalations.load(Ordering::Relaxed),
            lease_conflicts: self.inner.lease_conflicts.load(Ordering::Relaxed),
        }
    }
}
