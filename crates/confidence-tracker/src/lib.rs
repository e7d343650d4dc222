pub mod model;
pub mod tracker;

pub use model::{RetryStrategy, TrackerCfg};
pub use tracker::ConfidenceTracker;
