//! The mem host status store keeps the latest status of every host in
//! memory. Intended for development and testing.

use attest_api::*;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Debug, Default)]
struct Inner {
    latest: HashMap<HostId, HostStatus>,
    persist_count: usize,
}

/// An in-memory [HostStatusStore].
#[derive(Debug, Default)]
pub struct MemHostStatusStore(Mutex<Inner>);

impl MemHostStatusStore {
    /// Construct a new, empty store.
    pub fn create() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The latest status persisted for `host_id`.
    pub fn get(&self, host_id: &HostId) -> Option<HostStatus> {
        self.0.lock().unwrap().latest.get(host_id).cloned()
    }

    /// The number of records persisted so far, across all hosts.
    pub fn persist_count(&self) -> usize {
        self.0.lock().unwrap().persist_count
    }
}

impl HostStatusStore for MemHostStatusStore {
    fn persist(&self, host_status: HostStatus) -> BoxFut<'_, AtResult<()>> {
        Box::pin(async move {
            let mut lock = self.0.lock().unwrap();
            lock.persist_count += 1;
            lock.latest.insert(host_status.host_id, host_status);
            Ok(())
        })
    }
}
