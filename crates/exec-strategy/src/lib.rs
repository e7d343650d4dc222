pub mod errors;
pub mod model;
pub mod ports;

mod inproc;
mod subprocess;
mod thread;

pub use errors::ExecError;
pub use inproc::InProcessStrategy;
pub use model::{ChildLine, DriverReport, ExecCtx, StrategyCfg};
pub use ports::{BlockingDriver, DriverFault, ProcessLauncher};
pub use subprocess::ProcessIsolatedStrategy;
pub use thread::ThreadIsolatedStrategy;

use std::sync::Arc;

use async_trait::async_trait;
use uiact_core_types::{ActionRequest, ExecMode};

/// Contract for running one blocking driver attempt under a deadline.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn mode(&self) -> ExecMode;
    async fn execute(
        &self,
        ctx: &ExecCtx,
        request: &ActionRequest,
    ) -> Result<DriverReport, ExecError>;
}

/// Closed dispatch over the three isolation levels. Mode strings exist only
/// at the configuration boundary; everything here goes through this set.
pub struct StrategySet {
    inproc: InProcessStrategy,
    thread: ThreadIsolatedStrategy,
    subprocess: ProcessIsolatedStrategy,
}

impl StrategySet {
    pub fn new(
        driver: Arc<dyn BlockingDriver>,
        launcher: Arc<dyn ProcessLauncher>,
        cfg: StrategyCfg,
    ) -> Self {
        Self {
            inproc: InProcessStrategy::new(Arc::clone(&driver)),
            thread: ThreadIsolatedStrategy::new(driver),
            subprocess: ProcessIsolatedStrategy::new(launcher, cfg),
        }
    }

    pub fn strategy(&self, mode: ExecMode) -> &dyn ExecutionStrategy {
        match mode {
            ExecMode::InProc => &self.inproc,
            ExecMode::Thread => &self.thread,
            ExecMode::Subprocess => &self.subprocess,
        }
    }

    pub async fn execute(
        &self,
        mode: ExecMode,
        ctx: &ExecCtx,
        request: &ActionRequest,
    ) -> Result<DriverReport, ExecError> {
        self.strategy(mode).execute(ctx, request).await
    }
}
