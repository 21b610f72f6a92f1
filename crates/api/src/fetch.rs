//! Host data fetcher types.

use crate::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Consumes the result of an asynchronous host fetch.
#[cfg_attr(any(test, feature = "mockall"), mockall::automock)]
pub trait HostDataReceiver: 'static + Send + Sync + std::fmt::Debug {
    /// Called once per non-cancelled request when the fetch completes.
    ///
    /// `ctx` is the cancellation token the request was submitted with.
    /// An error returned from here is logged by the fetcher and does not
    /// affect other receivers.
    fn process_host_data(
        &self,
        ctx: CancellationToken,
        host: Host,
        host_data: AtResult<Arc<HostManifest>>,
    ) -> BoxFut<'_, AtResult<()>>;
}

/// Trait-object [HostDataReceiver].
pub type DynHostDataReceiver = Arc<dyn HostDataReceiver>;

/// Fetches host manifests, coalescing concurrent requests for the same
/// host into a single network operation.
pub trait HostDataFetcher: 'static + Send + Sync + std::fmt::Debug {
    /// Fetch the manifest of `host` directly, bypassing request
    /// coalescing. The host status is persisted either way, but a failure
    /// is returned to the caller and is not retried.
    ///
    /// There is no cancellation context parameter: dropping the returned
    /// future is how a caller cancels the fetch.
    fn retrieve(&self, host: Host) -> BoxFut<'_, AtResult<Arc<HostManifest>>>;

    /// Queue a fetch of `host`. Completion is observed through the
    /// receivers, which are invoked in order unless `ctx` has been
    /// cancelled by the time the result is dispatched.
    ///
    /// Returns [AtError::Stopped] once shutdown has begun.
    fn retrieve_async(
        &self,
        ctx: CancellationToken,
        host: Host,
        receivers: Vec<DynHostDataReceiver>,
    ) -> BoxFut<'_, AtResult<()>>;

    /// Stop accepting requests and wait for all internal tasks to exit.
    ///
    /// Requests that were queued but not yet dispatched are abandoned.
    fn shutdown(&self) -> BoxFut<'_, AtResult<()>>;
}

/// Trait-object [HostDataFetcher].
pub type DynHostDataFetcher = Arc<dyn HostDataFetcher>;

/// A factory for creating HostDataFetcher instances.
pub trait HostDataFetcherFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> AtResult<()>;

    /// Validate configuration.
    fn validate_config(&self, config: &config::Config) -> AtResult<()>;

    /// Construct a running HostDataFetcher instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
        connector: DynHostConnector,
        host_status_store: DynHostStatusStore,
    ) -> BoxFut<'static, AtResult<DynHostDataFetcher>>;
}

/// Trait-object [HostDataFetcherFactory].
pub type DynHostDataFetcherFactory = Arc<dyn HostDataFetcherFactory>;
