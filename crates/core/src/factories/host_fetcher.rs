//! The host fetcher retrieves host manifests through the host connector.
//!
//! Many callers may ask for the same host at roughly the same time. The
//! fetcher folds all of those requests into a single connector call and
//! fans the resulting manifest out to every caller's receivers.
//!
//! It consists of multiple parts:
//! - A pending work map from host id to the requests waiting on that host
//! - A work queue whose transform folds new requests into the map
//! - Worker tasks that fetch host data for host ids taken off the queue
//! - A retry queue and a retry task that re-dispatch failed hosts
//!
//! ### Pending work map
//!
//! - [HostDataFetcher::retrieve_async] puts a request on the work queue.
//! - The queue transform appends the request to the host's entry in the
//!   map. If the entry was vacant, the host id is forwarded to the workers
//!   as a dispatch trigger. If the entry was already present, a trigger
//!   is outstanding (queued, in flight or awaiting retry) and the request
//!   rides along with it.
//! - A host id is in the map only while at least one caller has a request
//!   for it that has been neither delivered nor dropped as cancelled.
//!
//! ### Worker tasks
//!
//! - Await a host id from the work channel.
//! - Drop cancelled requests from the host's entry. If none remain, remove
//!   the entry and do nothing.
//! - Otherwise fetch the host data, exactly once for all requests.
//! - On failure, persist status `UNKNOWN` and put a retry request on the
//!   retry queue. The requests stay in the map.
//! - On success, take the entry out of the map, persist status `CONNECTED`
//!   with the manifest and invoke the receivers of every request that is
//!   still not cancelled, in request order.
//!
//! Status persistence and receiver errors are logged and otherwise ignored.
//!
//! ### Retry task
//!
//! - Await a retry request from the retry work channel.
//! - Sleep until its retry time.
//! - Put the host id back on the work queue as a re-dispatch trigger, so
//!   a worker re-attempts the fetch for the requests still in the map.

use attest_api::*;
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::time::Instant;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::work_queue::work_queue;

#[cfg(test)]
mod test;

/// Default interval after which a failed host fetch is retried.
pub const DEFAULT_RETRY_INTERVAL_MINUTES: i64 = 5;

/// Largest accepted retry interval: one year.
pub const MAX_RETRY_INTERVAL_MINUTES: i64 = 60 * 24 * 365;

/// HostFetcher configuration types.
mod config {
    use attest_api::HostConnectionConfig;

    /// Configuration parameters for
    /// [HostFetcherFactory](super::HostFetcherFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct HostFetcherConfig {
        /// Number of worker tasks, which is also the capacity of the
        /// request and work channels of both queues. Default: 4.
        pub workers: u16,
        /// Minutes to wait before retrying a failed fetch. Values of 0 or
        /// less select the default, values above
        /// [MAX_RETRY_INTERVAL_MINUTES](super::MAX_RETRY_INTERVAL_MINUTES)
        /// are rejected by validation and clamped otherwise. Default: 5.
        pub retry_interval_minutes: i64,
        /// Service account used for hosts whose connection string carries
        /// no credentials.
        pub connection_config: HostConnectionConfig,
    }

    impl Default for HostFetcherConfig {
        fn default() -> Self {
            Self {
                workers: 4,
                retry_interval_minutes: super::DEFAULT_RETRY_INTERVAL_MINUTES,
                connection_config: HostConnectionConfig::default(),
            }
        }
    }

    impl HostFetcherConfig {
        /// The effective retry interval.
        pub fn retry_interval(&self) -> std::time::Duration {
            let minutes = if self.retry_interval_minutes <= 0 {
                super::DEFAULT_RETRY_INTERVAL_MINUTES
            } else {
                self.retry_interval_minutes
                    .min(super::MAX_RETRY_INTERVAL_MINUTES)
            };
            std::time::Duration::from_secs((minutes as u64).saturating_mul(60))
        }
    }

    /// Module-level configuration for HostFetcher.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct HostFetcherModConfig {
        /// HostFetcher configuration.
        pub host_fetcher: HostFetcherConfig,
    }
}

pub use config::*;

/// A production-ready host fetcher module.
#[derive(Debug)]
pub struct HostFetcherFactory {}

impl HostFetcherFactory {
    /// Construct a new HostFetcherFactory.
    pub fn create() -> DynHostDataFetcherFactory {
        Arc::new(Self {})
    }
}

impl HostDataFetcherFactory for HostFetcherFactory {
    fn default_config(&self, config: &mut Config) -> AtResult<()> {
        config.set_module_config(&HostFetcherModConfig::default())?;
        Ok(())
    }

    fn validate_config(&self, config: &Config) -> AtResult<()> {
        let config: HostFetcherModConfig = config.get_module_config()?;
        if config.host_fetcher.workers == 0 {
            return Err(AtError::other(
                "hostFetcher.workers must be at least 1",
            ));
        }
        if config.host_fetcher.retry_interval_minutes
            > MAX_RETRY_INTERVAL_MINUTES
        {
            return Err(AtError::other(format!(
                "hostFetcher.retryIntervalMinutes must be at most \
                 {MAX_RETRY_INTERVAL_MINUTES}",
            )));
        }
        Ok(())
    }

    fn create(
        &self,
        builder: Arc<Builder>,
        connector: DynHostConnector,
        host_status_store: DynHostStatusStore,
    ) -> BoxFut<'static, AtResult<DynHostDataFetcher>> {
        Box::pin(async move {
            let config: HostFetcherModConfig =
                builder.config.get_module_config()?;
            let out: DynHostDataFetcher = Arc::new(HostFetcher::new(
                config.host_fetcher,
                connector,
                host_status_store,
            ));
            Ok(out)
        })
    }
}

/// One caller's request for a host's data.
#[derive(Debug)]
struct FetchRequest {
    ctx: CancellationToken,
    host: Host,
    receivers: Vec<DynHostDataReceiver>,
}

/// A failed host to re-dispatch once `retry_time` has passed.
#[derive(Debug, Clone, Copy)]
struct RetryRequest {
    retry_time: Instant,
    host_id: HostId,
}

/// Items put on the work queue.
#[derive(Debug)]
enum QueueItem {
    /// A new request, folded into the pending work map.
    Fetch(FetchRequest),
    /// A host whose requests are already in the pending work map.
    Redispatch(HostId),
}

type PendingWorkMap = HashMap<HostId, Vec<FetchRequest>>;

#[derive(Debug)]
struct Inner {
    retry_interval: Duration,
    connection_config: HostConnectionConfig,
    connector: DynHostConnector,
    host_status_store: DynHostStatusStore,
    pending: Mutex<PendingWorkMap>,
    retry_tx: async_channel::Sender<RetryRequest>,
    quit: CancellationToken,
    tracker: TaskTracker,
}

/// The default [HostDataFetcher].
///
/// Must be constructed within a tokio runtime.
#[derive(Debug)]
pub struct HostFetcher {
    inner: Arc<Inner>,
    request_tx: async_channel::Sender<QueueItem>,
    stopped: AtomicBool,
}

impl HostFetcher {
    /// Construct a new host fetcher and spawn its tasks.
    pub fn new(
        config: HostFetcherConfig,
        connector: DynHostConnector,
        host_status_store: DynHostStatusStore,
    ) -> Self {
        let workers = config.workers.max(1) as usize;
        let quit = CancellationToken::new();
        let tracker = TaskTracker::new();

        let (retry_tx, retry_work_rx) =
            work_queue(workers, workers, Some, quit.clone(), &tracker);

        let inner = Arc::new(Inner {
            retry_interval: config.retry_interval(),
            connection_config: config.connection_config,
            connector,
            host_status_store,
            pending: Mutex::new(HashMap::new()),
            retry_tx,
            quit: quit.clone(),
            tracker: tracker.clone(),
        });

        let (request_tx, work_rx) = work_queue(
            workers,
            workers,
            {
                let inner = inner.clone();
                move |item: QueueItem| inner.add_work_to_map(item)
            },
            quit.clone(),
            &tracker,
        );

        for _ in 0..workers {
            tracker.spawn(Inner::worker(inner.clone(), work_rx.clone()));
        }
        tracker.spawn(Inner::retry_task(
            quit,
            retry_work_rx,
            request_tx.clone(),
        ));

        Self {
            inner,
            request_tx,
            stopped: AtomicBool::new(false),
        }
    }
}

impl HostDataFetcher for HostFetcher {
    fn retrieve(&self, host: Host) -> BoxFut<'_, AtResult<Arc<HostManifest>>> {
        Box::pin(async move {
            if self.stopped.load(Ordering::SeqCst) {
                return Err(AtError::Stopped);
            }

            match self.inner.get_host_data(&host).await {
                Ok(host_data) => {
                    self.inner
                        .persist(HostStatus::connected(
                            host.id,
                            host_data.clone(),
                        ))
                        .await;
                    Ok(Arc::new(host_data))
                }
                Err(err) => {
                    self.inner.persist(HostStatus::unknown(host.id)).await;
                    Err(err)
                }
            }
        })
    }

    fn retrieve_async(
        &self,
        ctx: CancellationToken,
        host: Host,
        receivers: Vec<DynHostDataReceiver>,
    ) -> BoxFut<'_, AtResult<()>> {
        Box::pin(async move {
            if self.stopped.load(Ordering::SeqCst) {
                return Err(AtError::Stopped);
            }

            let item = QueueItem::Fetch(FetchRequest {
                ctx,
                host,
                receivers,
            });
            tokio::select! {
                biased;
                _ = self.inner.quit.cancelled() => Err(AtError::Stopped),
                res = self.request_tx.send(item) => {
                    res.map_err(|_| AtError::Stopped)
                }
            }
        })
    }

    fn shutdown(&self) -> BoxFut<'_, AtResult<()>> {
        Box::pin(async move {
            self.stopped.store(true, Ordering::SeqCst);
            self.inner.quit.cancel();
            self.inner.tracker.close();
            self.inner.tracker.wait().await;
            tracing::debug!("host fetcher shut down");
            Ok(())
        })
    }
}

impl Drop for HostFetcher {
    fn drop(&mut self) {
        self.inner.quit.cancel();
    }
}

impl Inner {
    /// Queue transform: fold fetch requests into the pending work map and
    /// decide whether a dispatch trigger must be forwarded to the workers.
    fn add_work_to_map(&self, item: QueueItem) -> Option<HostId> {
        match item {
            QueueItem::Fetch(request) => {
                let host_id = request.host.id;
                match self.pending.lock().unwrap().entry(host_id) {
                    Entry::Occupied(mut o) => {
                        o.get_mut().push(request);
                        None
                    }
                    Entry::Vacant(v) => {
                        v.insert(vec![request]);
                        Some(host_id)
                    }
                }
            }
            QueueItem::Redispatch(host_id) => Some(host_id),
        }
    }

    async fn worker(
        inner: Arc<Inner>,
        work_rx: async_channel::Receiver<HostId>,
    ) {
        loop {
            let host_id = tokio::select! {
                biased;
                _ = inner.quit.cancelled() => break,
                host_id = work_rx.recv() => match host_id {
                    Ok(host_id) => host_id,
                    Err(_) => break,
                },
            };

            match inner.claim(host_id) {
                Some(host) => inner.fetch_data_and_respond(host).await,
                None => {
                    tracing::debug!(%host_id, "fetch for host cancelled");
                }
            }
        }
    }

    /// Drop cancelled requests for the host. Returns the host to fetch if
    /// any request remains; removes the entry otherwise.
    fn claim(&self, host_id: HostId) -> Option<Host> {
        let mut lock = self.pending.lock().unwrap();
        let Entry::Occupied(mut o) = lock.entry(host_id) else {
            return None;
        };

        o.get_mut().retain(|request| !request.ctx.is_cancelled());
        match o.get().first() {
            Some(request) => Some(request.host.clone()),
            None => {
                o.remove();
                None
            }
        }
    }

    async fn fetch_data_and_respond(&self, host: Host) {
        let host_data = match self.get_host_data(&host).await {
            Ok(host_data) => host_data,
            Err(err) => {
                tracing::error!(
                    host_id = %host.id,
                    "failed to fetch host data, retrying in {:?}: {err}",
                    self.retry_interval
                );
                self.persist(HostStatus::unknown(host.id)).await;
                self.schedule_retry(host.id);
                return;
            }
        };

        tracing::info!(host_id = %host.id, "fetched host data");

        let requests = self
            .pending
            .lock()
            .unwrap()
            .remove(&host.id)
            .unwrap_or_default();

        self.persist(HostStatus::connected(host.id, host_data.clone()))
            .await;

        let host_data = Arc::new(host_data);
        for request in requests {
            if request.ctx.is_cancelled() {
                tracing::debug!(host_id = %host.id, "request cancelled");
                continue;
            }
            for receiver in request.receivers.iter() {
                if let Err(err) = receiver
                    .process_host_data(
                        request.ctx.clone(),
                        request.host.clone(),
                        Ok(host_data.clone()),
                    )
                    .await
                {
                    tracing::warn!(
                        host_id = %host.id,
                        "receiver failed to process host data: {err}"
                    );
                }
            }
        }
    }

    async fn get_host_data(&self, host: &Host) -> AtResult<HostManifest> {
        let connection = ConnectionDescriptor::new(
            &host.connection_string,
            &self.connection_config,
        )?;
        self.connector.fetch_manifest(connection).await
    }

    async fn persist(&self, host_status: HostStatus) {
        let host_id = host_status.host_id;
        let host_state = host_status.host_state;
        if let Err(err) = self.host_status_store.persist(host_status).await {
            tracing::error!(
                %host_id,
                ?host_state,
                "could not persist host status: {err}"
            );
        }
    }

    /// Put a retry request on the retry queue without blocking the worker.
    fn schedule_retry(&self, host_id: HostId) {
        let now = Instant::now();
        let retry_time = now
            .checked_add(self.retry_interval)
            .or_else(|| {
                now.checked_add(Duration::from_secs(
                    MAX_RETRY_INTERVAL_MINUTES as u64 * 60,
                ))
            })
            .unwrap_or(now);
        let retry = RetryRequest {
            retry_time,
            host_id,
        };

        match self.retry_tx.try_send(retry) {
            Ok(()) => (),
            Err(async_channel::TrySendError::Full(retry)) => {
                let retry_tx = self.retry_tx.clone();
                let quit = self.quit.clone();
                self.tracker.spawn(async move {
                    tokio::select! {
                        biased;
                        _ = quit.cancelled() => (),
                        _ = retry_tx.send(retry) => (),
                    }
                });
            }
            Err(async_channel::TrySendError::Closed(_)) => {
                tracing::debug!(%host_id, "retry queue closed, dropping retry");
            }
        }
    }

    async fn retry_task(
        quit: CancellationToken,
        retry_work_rx: async_channel::Receiver<RetryRequest>,
        request_tx: async_channel::Sender<QueueItem>,
    ) {
        loop {
            let retry = tokio::select! {
                biased;
                _ = quit.cancelled() => break,
                retry = retry_work_rx.recv() => match retry {
                    Ok(retry) => retry,
                    Err(_) => break,
                },
            };

            tokio::select! {
                biased;
                _ = quit.cancelled() => break,
                _ = tokio::time::sleep_until(retry.retry_time) => (),
            }

            tracing::debug!(host_id = %retry.host_id, "retrying host fetch");

            tokio::select! {
                biased;
                _ = quit.cancelled() => break,
                res = request_tx.send(QueueItem::Redispatch(retry.host_id)) => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
