use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uiact_core_types::ActionId;

/// Per-attempt execution context delivered by the executor.
#[derive(Clone, Debug)]
pub struct ExecCtx {
    pub action_id: ActionId,
    /// Deadline for this single attempt's driver call.
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl ExecCtx {
    pub fn new(action_id: ActionId, timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            action_id,
            timeout,
            cancel,
        }
    }
}

/// What the driver observed after performing the action. `state` is the
/// opaque snapshot the verification tiers inspect.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DriverReport {
    #[serde(default)]
    pub state: serde_json::Value,
    pub note: Option<String>,
}

impl DriverReport {
    pub fn with_state(state: serde_json::Value) -> Self {
        Self { state, note: None }
    }
}

/// Wire format for the single report line a child driver process prints on
/// stdout before exiting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChildLine {
    pub ok: bool,
    #[serde(default)]
    pub state: serde_json::Value,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Strategy tuning.
#[derive(Clone, Copy, Debug)]
pub struct StrategyCfg {
    /// How long a child gets between graceful termination and the hard kill.
    pub grace: Duration,
}

impl Default for StrategyCfg {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(2),
        }
    }
}
