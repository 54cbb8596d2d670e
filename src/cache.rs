//! Load-once cache of parsed flight tables, keyed by source identity.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::flights::FlightTable;
use crate::loader::load_source;
use crate::source::{Source, SourceKey};

type Slot = Arc<OnceCell<Arc<FlightTable>>>;

/// Memoizes [`FlightTable`]s per source for as long as the cache lives.
///
/// Concurrent callers asking for the same source share a single load. A
/// failed load drops its slot so the next call tries again.
#[derive(Default)]
pub struct TableCache {
    slots: Mutex<HashMap<SourceKey, Slot>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table for `source`, loading it on first use.
    pub async fn get_or_load(&self, source: &Source) -> Result<Arc<FlightTable>> {
        self.get_or_try_init(source.key(), || load_source(source))
            .await
    }

    /// Returns the table cached under `key`, running `load` if there is none yet.
    pub async fn get_or_try_init<F, Fut>(&self, key: SourceKey, load: F) -> Result<Arc<FlightTable>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FlightTable>>,
    {
        let slot = {
            let mut slots = self.lock();
            slots.entry(key.clone()).or_default().clone()
        };

        if let Some(table) = slot.get() {
            debug!(source = %key, "Flight table cache hit");
            return Ok(table.clone());
        }

        let load_key = key.clone();
        let loaded = slot
            .get_or_try_init(move || async move {
                debug!(source = %load_key, "Flight table cache miss, loading");
                load().await.map(Arc::new)
            })
            .await;

        match loaded {
            Ok(table) => Ok(table.clone()),
            Err(err) => {
                self.forget_failed(&key, &slot);
                Err(err)
            }
        }
    }

    /// Removes the slot for `key` after a failed load, unless another caller
    /// has replaced or filled it meanwhile.
    fn forget_failed(&self, key: &SourceKey, slot: &Slot) {
        let mut slots = self.lock();
        let stale = slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if stale {
            slots.remove(key);
            debug!(source = %key, "Flight table load failed, slot removed");
        }
    }

    /// Drops the cached table for `source`. Returns whether an entry existed.
    pub fn invalidate(&self, source: &Source) -> bool {
        let key = source.key();
        let removed = self.lock().remove(&key).is_some();
        debug!(source = %key, removed, "Flight table cache invalidated");
        removed
    }

    /// Drops every cached table.
    pub fn clear(&self) {
        self.lock().clear();
        debug!("Flight table cache cleared");
    }

    /// Number of sources with a loaded table.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SourceKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
