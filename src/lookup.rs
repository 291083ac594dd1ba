use std::net::IpAddr;

use log::debug;

use crate::cache::SnapshotCache;
use crate::error::LookupError;
use crate::record::ContainerRecord;
use crate::types::short_id;

/// Answers "who is this container?" against the cached snapshot.
pub struct LookupService {
    cache: SnapshotCache,
}

impl LookupService {
    pub fn new(cache: SnapshotCache) -> Self {
        Self { cache }
    }

    /// Finds a container by identifier. Full and short identifiers both
    /// resolve, since the snapshot is keyed by the short form.
    pub async fn by_key(&self, id: &str) -> Result<ContainerRecord, LookupError> {
        let snapshot = self.cache.get().await?;
        let record = snapshot.get(short_id(id)).cloned().ok_or_else(|| {
            debug!("Container info not found for {}", id);
            LookupError::NotFound(id.to_string())
        })?;
        Ok(record)
    }

    /// Finds the first container, in inventory order, with an interface
    /// on `addr`.
    pub async fn by_address(&self, addr: IpAddr) -> Result<ContainerRecord, LookupError> {
        let addr = addr.to_canonical();
        let snapshot = self.cache.get().await?;
        let found = snapshot
            .records()
            .find(|record| record.has_address(addr))
            .cloned();
        let record = found.ok_or_else(|| {
            debug!("Couldn't find container info for {}", addr);
            LookupError::AddressNotFound(addr)
        })?;
        Ok(record)
    }
}
