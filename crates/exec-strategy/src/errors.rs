use std::time::Duration;

use thiserror::Error;
use uiact_core_types::{EngineError, ErrorKind};

use crate::ports::DriverFault;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("attempt deadline exceeded after {waited:?}")]
    Timeout { waited: Duration },
    #[error("cancelled by caller")]
    Cancelled,
    #[error(transparent)]
    Driver(#[from] DriverFault),
    #[error("worker thread terminated before replying")]
    WorkerGone,
    #[error("child protocol violation: {0}")]
    Protocol(String),
    #[error("failed to start child driver: {0}")]
    Spawn(#[from] std::io::Error),
}

impl From<ExecError> for EngineError {
    fn from(err: ExecError) -> Self {
        let kind = match &err {
            ExecError::Timeout { .. } => ErrorKind::Timeout,
            // a cancelled attempt is handled like a deadline expiry
            ExecError::Cancelled => ErrorKind::Timeout,
            ExecError::Driver(_)
            | ExecError::WorkerGone
            | ExecError::Protocol(_)
            | ExecError::Spawn(_) => ErrorKind::DriverUnavailable,
        };
        EngineError::new(kind, err.to_string())
    }
}
