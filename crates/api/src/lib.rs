#![deny(missing_docs)]
//! Attestation API contains the collaborator traits and the basic types
//! required to define the api of those traits.
//!
//! - [HostDataFetcher] turns many overlapping fetch requests for the same
//!   host into a single [HostConnector] call, persists the outcome through
//!   a [HostStatusStore] and fans the manifest out to [HostDataReceiver]s.
//! - [Rule] and [TrustReportRule] inspect a [HostManifest] / [TrustReport]
//!   and accumulate [Fault]s.
//!
//! Implementations live in the attest_core crate.

/// Boxed future type.
pub type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub(crate) mod serde_bytes_base64 {
    pub fn serialize<S>(
        b: &bytes::Bytes,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use base64::prelude::*;
        serializer.serialize_str(&BASE64_STANDARD.encode(b))
    }

    pub fn deserialize<'de, D, T: From<bytes::Bytes>>(
        deserializer: D,
    ) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use base64::prelude::*;
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(s)
            .map(|v| bytes::Bytes::from(v).into())
            .map_err(serde::de::Error::custom)
    }
}

pub mod builder;
pub use builder::*;

pub mod config;
pub use config::*;

mod error;
pub use error::*;

pub mod id;
pub use id::HostId;

mod timestamp;
pub use timestamp::*;

pub mod host;
pub use host::*;

pub mod connector;
pub use connector::*;

pub mod host_status;
pub use host_status::*;

pub mod fetch;
pub use fetch::*;

pub mod flavor;
pub use flavor::*;

pub mod trust;
pub use trust::*;

pub mod rule;
pub use rule::*;
