
pub(crate) mod utils {
    use super::super::*;
    use crate::factories::MemHostStatusStore;
    use attest_test_utils::{host::test_manifest, id::random_host_id};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    pub struct TestCase {
        pub fetcher: HostFetcher,
        pub store: Arc<MemHostStatusStore>,
        /// Urls passed to the connector, in call order.
        pub fetches: Arc<Mutex<Vec<String>>>,
        /// Every connector call takes one permit before it completes.
        pub gate: Arc<Semaphore>,
    }

    impl TestCase {
        pub fn fetch_count(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }

        pub fn pending_len(&self) -> usize {
            self.fetcher.inner.pending.lock().unwrap().len()
        }

        pub fn host_state(&self, host_id: &HostId) -> Option<HostState> {
            self.store.get(host_id).map(|s| s.host_state)
        }
    }

    /// A host whose connection url is unique to it.
    pub fn unique_host() -> Host {
        let id = random_host_id();
        Host {
            id,
            host_name: format!("host-{id}"),
            connection_string: format!("intel:https://{id}:1443"),
            description: None,
        }
    }

    pub fn setup_test(
        config: HostFetcherConfig,
        gated: bool,
        fail_first: usize,
    ) -> TestCase {
        let store = MemHostStatusStore::create();
        let fetches = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::new(Semaphore::new(if gated {
            0
        } else {
            Semaphore::MAX_PERMITS
        }));
        let connector = make_mock_connector(
            fetches.clone(),
            gate.clone(),
            Arc::new(AtomicUsize::new(fail_first)),
        );

        let fetcher = HostFetcher::new(config, connector, store.clone());

        TestCase {
            fetcher,
            store,
            fetches,
            gate,
        }
    }

    /// A connector that fails the first `failures` calls and otherwise
    /// returns a manifest named after the connection url.
    pub fn make_mock_connector(
        fetches: Arc<Mutex<Vec<String>>>,
        gate: Arc<Semaphore>,
        failures: Arc<AtomicUsize>,
    ) -> Arc<MockHostConnector> {
        let mut connector = MockHostConnector::new();
        connector.expect_fetch_manifest().returning(move |connection| {
            let fetches = fetches.clone();
            let gate = gate.clone();
            let failures = failures.clone();
            Box::pin(async move {
                fetches.lock().unwrap().push(connection.url.clone());
                gate.acquire().await.unwrap().forget();
                if failures
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                        n.checked_sub(1)
                    })
                    .is_ok()
                {
                    return Err(AtError::other("connection refused"));
                }
                Ok(test_manifest(&connection.url))
            })
        });
        Arc::new(connector)
    }

    /// A receiver that logs its tag into a log shared with other receivers.
    #[derive(Debug)]
    pub struct TaggedReceiver {
        pub tag: usize,
        pub log: Arc<Mutex<Vec<usize>>>,
    }

    impl HostDataReceiver for TaggedReceiver {
        fn process_host_data(
            &self,
            _ctx: CancellationToken,
            _host: Host,
            _host_data: AtResult<Arc<HostManifest>>,
        ) -> BoxFut<'_, AtResult<()>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.tag);
                Ok(())
            })
        }
    }
}
