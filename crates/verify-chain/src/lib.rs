pub mod chain;
pub mod errors;
pub mod model;
pub mod ports;

pub use chain::VerificationChain;
pub use errors::VerifyError;
pub use model::{ChainPolicy, ChainVerdict, DriverState, TierReading};
pub use ports::{AuthorityPort, StructuralPort, VisionPort};
