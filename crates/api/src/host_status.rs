//! Host status store types.

use crate::*;
use std::sync::Arc;

/// Persists the outcome of every host fetch attempt.
///
/// Persistence is best-effort: the host fetcher logs failures returned
/// from here and never retries or aborts because of them.
#[cfg_attr(any(test, feature = "mockall"), mockall::automock)]
pub trait HostStatusStore: 'static + Send + Sync + std::fmt::Debug {
    /// Create or overwrite the status record of a host.
    fn persist(&self, host_status: HostStatus) -> BoxFut<'_, AtResult<()>>;
}

/// Trait-object [HostStatusStore].
pub type DynHostStatusStore = Arc<dyn HostStatusStore>;
