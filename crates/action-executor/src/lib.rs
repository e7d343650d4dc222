pub mod events;
pub mod executor;
pub mod metrics;
pub mod model;

mod redact;

pub use events::{EventsPort, NoopEvents};
pub use executor::ActionExecutor;
pub use metrics::{ExecMetrics, MetricsSnapshot};
pub use model::{AttemptTrace, ExecPhase, ExecutorCfg};
