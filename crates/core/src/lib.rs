#![deny(missing_docs)]
//! Attestation core: the host data fetch scheduler and the trust rule
//! engine.

use attest_api::*;

/// Construct a production-ready default builder.
///
/// - `host_fetcher` - The default host fetcher is
///   [factories::HostFetcherFactory].
pub fn default_builder() -> Builder {
    Builder {
        config: Config::default(),
        host_fetcher: factories::HostFetcherFactory::create(),
    }
}

pub mod factories;

pub mod verifier;

mod work_queue;
