use async_trait::async_trait;
use uiact_core_types::{ActionId, ActionRequest, ActionResult, ExecMode};

/// Observation hooks around the attempt loop.
#[async_trait]
pub trait EventsPort: Send + Sync {
    async fn emit_started(&self, action: &ActionId, request: &ActionRequest);
    async fn emit_attempt(&self, action: &ActionId, attempt: u32, driver: ExecMode);
    async fn emit_finished(&self, action: &ActionId, result: &ActionResult);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEvents;

#[async_trait]
impl EventsPort for NoopEvents {
    async fn emit_started(&self, _action: &ActionId, _request: &ActionRequest) {}
    async fn emit_attempt(&self, _action: &ActionId, _attempt: u32, _driver: ExecMode) {}
    async fn emit_finished(&self, _action: &ActionId, _result: &ActionResult) {}
}
