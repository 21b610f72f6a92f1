//! Factories for generating instances of attestation modules.

pub mod host_fetcher;
pub use host_fetcher::{HostFetcher, HostFetcherFactory};

mod mem_host_status_store;
pub use mem_host_status_store::*;
