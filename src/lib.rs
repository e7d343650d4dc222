//! Action execution and verification engine for UI automation whose driver
//! calls are synchronous and can hang.
//!
//! The engine runs each action under an isolation strategy chosen per call
//! (in-process, thread-isolated, or process-isolated — only the last can
//! always be recovered), confirms the effect through a tiered verification
//! chain (vision model, structural probe, authoritative API), and learns
//! which driver is reliable per `(action, platform, driver)` pattern to
//! adapt its retry policy over time.

pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};

pub use action_executor::{EventsPort, ExecMetrics, MetricsSnapshot, NoopEvents};
pub use exec_strategy::{BlockingDriver, ChildLine, DriverFault, DriverReport, ProcessLauncher};
pub use pattern_store::{PatternRecord, RecentOutcome};
pub use uiact_core_types::{
    ActionId, ActionKind, ActionRequest, ActionResult, ErrorKind, ExecMode, OwnerId, PatternKey,
    ResourceId, VerifyMethod,
};
pub use verify_chain::{AuthorityPort, DriverState, StructuralPort, TierReading, VisionPort};
