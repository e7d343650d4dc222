use std::io;

use thiserror::Error;
use tokio::process::Child;
use uiact_core_types::ActionRequest;

use crate::model::DriverReport;

/// Why a driver call did not produce a report.
#[derive(Debug, Error, Clone)]
pub enum DriverFault {
    #[error("driver unavailable: {0}")]
    Unavailable(String),
    #[error("driver faulted: {0}")]
    Faulted(String),
}

/// The underlying synchronous driver call. `perform` may block its thread
/// indefinitely; the strategies own the problem of getting control back.
pub trait BlockingDriver: Send + Sync {
    fn name(&self) -> &str;
    fn perform(&self, request: &ActionRequest) -> Result<DriverReport, DriverFault>;
}

/// Starts the driver in a dedicated child process. The child performs the
/// action, prints one `ChildLine` JSON object on stdout, and exits; stdout
/// must be piped. A closure cannot cross the process boundary, so this port
/// describes how to start the program that is the driver.
pub trait ProcessLauncher: Send + Sync {
    fn name(&self) -> &str;
    fn spawn(&self, request: &ActionRequest) -> io::Result<Child>;
}
