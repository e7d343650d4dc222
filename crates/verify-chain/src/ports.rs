use async_trait::async_trait;
use uiact_core_types::ActionRequest;

use crate::errors::VerifyError;
use crate::model::{DriverState, TierReading};

/// Tier 1: snapshot the current visual state and ask a vision model whether
/// the requested effect is present. Non-deterministic; advisory unless its
/// self-reported confidence clears the chain threshold.
#[async_trait]
pub trait VisionPort: Send + Sync {
    async fn assess(
        &self,
        request: &ActionRequest,
        state: &DriverState,
    ) -> Result<TierReading, VerifyError>;
}

/// Tier 2: query the UI's structural representation for the known element.
/// Deterministic when a structural hint is available; a clear answer here
/// overrides tier 1.
#[async_trait]
pub trait StructuralPort: Send + Sync {
    async fn probe(
        &self,
        request: &ActionRequest,
        hint: &str,
        state: &DriverState,
    ) -> Result<TierReading, VerifyError>;
}

/// Tier 3: ask the platform's own API for the same fact. Slow and
/// rate-limited; consulted only when the cheaper tiers stay inconclusive.
#[async_trait]
pub trait AuthorityPort: Send + Sync {
    async fn confirm(&self, request: &ActionRequest) -> Result<TierReading, VerifyError>;
}
