use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uiact_core_types::{OwnerId, ResourceId};

/// Time-bounded, owner-tagged exclusive claim on one automation resource.
/// Expiry is judged purely from the record, so a crashed owner's lease
/// becomes acquirable once the TTL passes even though it was never released.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lease {
    pub resource_id: ResourceId,
    pub owner_id: OwnerId,
    pub acquired_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl Lease {
    pub fn new(resource_id: ResourceId, owner_id: OwnerId, ttl: Duration) -> Self {
        Self {
            resource_id,
            owner_id,
            acquired_at: Utc::now(),
            ttl,
        }
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => now > self.acquired_at + ttl,
            // a TTL too large for chrono effectively never expires
            Err(_) => false,
        }
    }
}
