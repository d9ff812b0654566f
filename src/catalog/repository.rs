//! Memoized catalog index, keyed by loader fingerprint.
//!
//! The cache holds at most one built index. Sessions share it through an
//! `Arc<IndexCache>`; the index itself is handed out as `Arc<CatalogIndex>` so
//! readers never block a rebuild and a rebuild never disturbs readers.

use crate::catalog::index::CatalogIndex;
use crate::catalog::loader::CatalogLoader;
use crate::error::CatalogError;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Default)]
/// Single-slot store for the most recently built `CatalogIndex`.
pub struct IndexCache {
    slot: Mutex<Option<Arc<CatalogIndex>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index when the loader's fingerprint is unchanged,
    /// otherwise load the tables and rebuild.
    ///
    /// Only `fingerprint()` is consulted on a hit; table content is not
    /// reinspected. A failed build leaves the previous index in place.
    pub fn get_or_build(
        &self,
        loader: &dyn CatalogLoader,
    ) -> Result<Arc<CatalogIndex>, CatalogError> {
        let fingerprint = loader.fingerprint()?;
        let mut slot = self.slot.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(index) = slot.as_ref() {
            if index.fingerprint() == &fingerprint {
                debug!(fingerprint = %fingerprint, "catalog index cache hit");
                return Ok(Arc::clone(index));
            }
        }

        info!(fingerprint = %fingerprint, "building catalog index");
        let tables = loader.load()?;
        let index = Arc::new(CatalogIndex::build(&tables, fingerprint)?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Currently cached index, if any, without consulting a loader.
    pub fn cached(&self) -> Option<Arc<CatalogIndex>> {
        self.slot
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    /// Drop the cached index so the next `get_or_build` rebuilds regardless of fingerprint.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|err| err.into_inner());
        if slot.take().is_some() {
            info!("catalog index cache invalidated");
        }
    }
}
