use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};
use uiact_core_types::{ActionRequest, ExecMode};

use crate::errors::ExecError;
use crate::model::{DriverReport, ExecCtx};
use crate::ports::BlockingDriver;
use crate::ExecutionStrategy;

/// No isolation: the driver call runs on the caller's own thread and a hang
/// here stalls the whole process. Debug/dev use only.
pub struct InProcessStrategy {
    driver: Arc<dyn BlockingDriver>,
}

impl InProcessStrategy {
    pub fn new(driver: Arc<dyn BlockingDriver>) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl ExecutionStrategy for InProcessStrategy {
    fn mode(&self) -> ExecMode {
        ExecMode::InProc
    }

    #[instrument(skip_all, fields(action = %ctx.action_id.0, driver = self.driver.name()))]
    async fn execute(
        &self,
        ctx: &ExecCtx,
        request: &ActionRequest,
    ) -> Result<DriverReport, ExecError> {
        warn!("running without isolation; a hung driver call cannot be recovered");
        Ok(self.driver.perform(request)?)
    }
}
