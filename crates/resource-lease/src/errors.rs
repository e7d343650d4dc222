use std::io;

use thiserror::Error;
use uiact_core_types::{EngineError, ErrorKind, OwnerId, ResourceId};

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("resource {resource} is leased by owner {owner:?}")]
    Held { resource: ResourceId, owner: OwnerId },
    #[error("lease record I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl From<LeaseError> for EngineError {
    fn from(err: LeaseError) -> Self {
        EngineError::new(ErrorKind::ResourceUnavailable, err.to_string())
    }
}
