pub mod errors;
pub mod model;
pub mod store;

mod log;
mod replay;

pub use errors::StoreError;
pub use model::{Outcome, OutcomeLine, PatternRecord, RecentOutcome, StoreCfg, RECENT_CAP};
pub use store::PatternStore;
