use std::fmt;
use std::time::Duration;

use uiact_core_types::{ExecMode, VerifyMethod};

/// Attempt-loop state, surfaced in spans and diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecPhase {
    Pending,
    Executing,
    Verifying,
    Retrying,
    Succeeded,
    Failed,
}

impl ExecPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecPhase::Pending => "pending",
            ExecPhase::Executing => "executing",
            ExecPhase::Verifying => "verifying",
            ExecPhase::Retrying => "retrying",
            ExecPhase::Succeeded => "succeeded",
            ExecPhase::Failed => "failed",
        }
    }
}

/// Diagnostic record for one attempt, joined into `raw_detail`.
#[derive(Clone, Debug)]
pub struct AttemptTrace {
    pub index: u32,
    pub driver: ExecMode,
    pub duration_ms: u64,
    pub verified_by: Option<VerifyMethod>,
    pub error: Option<String>,
}

impl fmt::Display for AttemptTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempt {} [{}] {}ms",
            self.index, self.driver, self.duration_ms
        )?;
        if let Some(method) = self.verified_by {
            write!(f, " verified={method}")?;
        }
        match &self.error {
            Some(error) => write!(f, " error={error}"),
            None => write!(f, " ok"),
        }
    }
}

/// Executor configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecutorCfg {
    /// Caller-pinned execution mode. `None` lets the tracker's
    /// recommendation choose per pattern; escalation can override either.
    pub requested_mode: Option<ExecMode>,
}

impl ExecutorCfg {
    pub fn pinned(mode: ExecMode) -> Self {
        Self {
            requested_mode: Some(mode),
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
