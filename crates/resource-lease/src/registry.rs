use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};
use uiact_core_types::{OwnerId, ResourceId};

use crate::errors::LeaseError;
use crate::model::Lease;

/// In-process lease table with an optional on-disk record per resource so
/// other processes (or a restart after a crash) see outstanding claims.
/// Contention fails immediately; queuing is the caller's decision.
#[derive(Debug)]
pub struct LeaseRegistry {
    table: DashMap<ResourceId, Lease>,
    dir: Option<PathBuf>,
    ttl: Duration,
}

impl LeaseRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            table: DashMap::new(),
            dir: None,
            ttl,
        }
    }

    pub fn with_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            table: DashMap::new(),
            dir: Some(dir.into()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Claim the resource for `owner`. Holding the shard entry for the whole
    /// check-then-set keeps two racing owners from both succeeding.
    pub fn acquire(
        &self,
        resource: &ResourceId,
        owner: &OwnerId,
    ) -> Result<LeaseGuard<'_>, LeaseError> {
        let now = Utc::now();
        match self.table.entry(resource.clone()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                if !current.expired(now) && current.owner_id != *owner {
                    return Err(LeaseError::Held {
                        resource: resource.clone(),
                        owner: current.owner_id.clone(),
                    });
                }
                let lease = Lease::new(resource.clone(), owner.clone(), self.ttl);
                self.persist(&lease)?;
                occupied.insert(lease);
            }
            Entry::Vacant(vacant) => {
                if let Some(foreign) = self.read_record(resource) {
                    if !foreign.expired(now) && foreign.owner_id != *owner {
                        return Err(LeaseError::Held {
                            resource: resource.clone(),
                            owner: foreign.owner_id,
                        });
                    }
                }
                let lease = Lease::new(resource.clone(), owner.clone(), self.ttl);
                self.persist(&lease)?;
                vacant.insert(lease);
            }
        }
        debug!(resource = %resource, "lease acquired");
        Ok(LeaseGuard {
            registry: self,
            resource: resource.clone(),
            owner: owner.clone(),
        })
    }

    /// Release only succeeds for the holding owner; anything else is a no-op.
    pub fn release(&self, resource: &ResourceId, owner: &OwnerId) {
        let removed = self
            .table
            .remove_if(resource, |_, lease| lease.owner_id == *owner)
            .is_some();
        if removed {
            if let Some(path) = self.record_path(resource) {
                if let Err(err) = fs::remove_file(&path) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        warn!(?err, path = %path.display(), "failed to remove lease record");
                    }
                }
            }
            debug!(resource = %resource, "lease released");
        }
    }

    /// Current holder, if any unexpired lease exists.
    pub fn holder(&self, resource: &ResourceId) -> Option<OwnerId> {
        let now = Utc::now();
        self.table.get(resource).and_then(|lease| {
            if lease.expired(now) {
                None
            } else {
                Some(lease.owner_id.clone())
            }
        })
    }

    fn persist(&self, lease: &Lease) -> Result<(), LeaseError> {
        let Some(path) = self.record_path(&lease.resource_id) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, lease)
            .map_err(|err| LeaseError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
        Ok(())
    }

    fn read_record(&self, resource: &ResourceId) -> Option<Lease> {
        let path = self.record_path(resource)?;
        let raw = fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn record_path(&self, resource: &ResourceId) -> Option<PathBuf> {
        let dir = self.dir.as_deref()?;
        Some(record_file(dir, resource))
    }
}

fn record_file(dir: &Path, resource: &ResourceId) -> PathBuf {
    let safe: String = resource
        .0
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("{safe}.lease.json"))
}

/// RAII handle; dropping it releases the lease.
#[derive(Debug)]
pub struct LeaseGuard<'a> {
    registry: &'a LeaseRegistry,
    resource: ResourceId,
    owner: OwnerId,
}

impl LeaseGuard<'_> {
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.resource, &self.owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> ResourceId {
        ResourceId("browser-1".into())
    }

    #[test]
    fn second_owner_is_rejected_while_held() {
        let registry = LeaseRegistry::new(Duration::from_secs(300));
        let alice = OwnerId::new();
        let bob = OwnerId::new();

        let guard = registry.acquire(&resource(), &alice).expect("alice claims");
        let err = registry.acquire(&resource(), &bob).expect_err("bob blocked");
        assert!(matches!(err, LeaseError::Held { .. }));
        drop(guard);

        registry.acquire(&resource(), &bob).expect("free after drop");
    }

    #[test]
    fn holder_may_reacquire_its_own_lease() {
        let registry = LeaseRegistry::new(Duration::from_secs(300));
        let alice = OwnerId::new();
        let first = registry.acquire(&resource(), &alice).expect("first");
        let second = registry.acquire(&resource(), &alice).expect("refresh");
        drop(first);
        drop(second);
    }

    #[test]
    fn expired_lease_is_acquirable_without_release() {
        let registry = LeaseRegistry::new(Duration::from_millis(1));
        let alice = OwnerId::new();
        let bob = OwnerId::new();

        let guard = registry.acquire(&resource(), &alice).expect("alice claims");
        std::thread::sleep(Duration::from_millis(10));
        // alice crashed: the guard is leaked, never released
        std::mem::forget(guard);

        registry
            .acquire(&resource(), &bob)
            .expect("ttl bounds the damage");
    }

    #[test]
    fn on_disk_record_blocks_a_second_registry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ttl = Duration::from_secs(300);
        let first = LeaseRegistry::with_dir(dir.path(), ttl);
        let second = LeaseRegistry::with_dir(dir.path(), ttl);
        let alice = OwnerId::new();
        let bob = OwnerId::new();

        let guard = first.acquire(&resource(), &alice).expect("alice claims");
        let err = second
            .acquire(&resource(), &bob)
            .expect_err("record visible across registries");
        assert!(matches!(err, LeaseError::Held { .. }));

        drop(guard);
        second.acquire(&resource(), &bob).expect("record removed");
    }
}
