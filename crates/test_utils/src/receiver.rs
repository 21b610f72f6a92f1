//! Test utilities associated with host data receivers.

use attest_api::*;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// A single receiver invocation.
pub type ReceivedHostData = (HostId, AtResult<Arc<HostManifest>>);

/// A receiver that records every invocation.
#[derive(Debug, Default)]
pub struct RecordingReceiver {
    received: Mutex<Vec<ReceivedHostData>>,
    fail: bool,
}

impl RecordingReceiver {
    /// Construct a receiver that records and succeeds.
    pub fn create() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Construct a receiver that records and then returns an error.
    pub fn create_failing() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    /// Everything received so far.
    pub fn received(&self) -> Vec<ReceivedHostData> {
        self.received.lock().unwrap().clone()
    }

    /// Number of invocations so far.
    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

impl HostDataReceiver for RecordingReceiver {
    fn process_host_data(
        &self,
        _ctx: CancellationToken,
        host: Host,
        host_data: AtResult<Arc<HostManifest>>,
    ) -> BoxFut<'_, AtResult<()>> {
        Box::pin(async move {
            self.received.lock().unwrap().push((host.id, host_data));
            if self.fail {
                Err(AtError::other("receiver failure"))
            } else {
                Ok(())
            }
        })
    }
}
