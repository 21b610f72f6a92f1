//! Host connector types.
//!
//! The connector is the network collaborator that retrieves a
//! [HostManifest] from a managed host. The attestation protocol itself
//! and manifest signature verification are the connector's concern.

use crate::*;
use std::sync::Arc;

/// Service account material used to fill in credentials that a host
/// connection string does not carry itself.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConnectionConfig {
    /// Service account user name.
    pub service_username: String,
    /// Service account password.
    pub service_password: String,
}

/// The kind of agent running on a host.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Trust agent on a linux host.
    Intel,
    /// Trust agent on a windows host.
    Microsoft,
    /// VMware vCenter managed host.
    Vmware,
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Intel => "intel",
            Self::Microsoft => "microsoft",
            Self::Vmware => "vmware",
        })
    }
}

impl std::str::FromStr for Vendor {
    type Err = AtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intel" => Ok(Self::Intel),
            "microsoft" => Ok(Self::Microsoft),
            "vmware" => Ok(Self::Vmware),
            _ => Err(AtError::invalid_input(format!("unknown vendor: {s}"))),
        }
    }
}

/// A parsed host connection string with credentials resolved.
///
/// Connection strings have the form
/// `<vendor>:<url>[;u=<username>][;p=<password>]`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Agent vendor.
    pub vendor: Vendor,
    /// Agent address.
    pub url: String,
    /// User name to authenticate with.
    pub username: String,
    /// Password to authenticate with.
    pub password: String,
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("vendor", &self.vendor)
            .field("url", &self.url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ConnectionDescriptor {
    /// Parse a connection string, taking any credentials it does not
    /// specify from the service account config.
    pub fn new(
        connection_string: &str,
        config: &HostConnectionConfig,
    ) -> AtResult<Self> {
        let (vendor, rest) =
            connection_string.split_once(':').ok_or_else(|| {
                AtError::invalid_input(format!(
                    "connection string has no vendor prefix: {connection_string}"
                ))
            })?;
        let vendor: Vendor = vendor.trim().parse()?;

        let mut parts = rest.split(';');
        let url = parts.next().unwrap_or_default().trim().to_string();
        if url.is_empty() {
            return Err(AtError::invalid_input(
                "connection string has no address",
            ));
        }

        let mut username = None;
        let mut password = None;
        for part in parts.map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some(("u", v)) | Some(("username", v)) => {
                    username = Some(v.to_string())
                }
                Some(("p", v)) | Some(("password", v)) => {
                    password = Some(v.to_string())
                }
                _ => {
                    return Err(AtError::invalid_input(format!(
                        "unrecognized connection string option: {part}"
                    )))
                }
            }
        }

        Ok(Self {
            vendor,
            url,
            username: username
                .unwrap_or_else(|| config.service_username.clone()),
            password: password
                .unwrap_or_else(|| config.service_password.clone()),
        })
    }
}

/// Retrieves manifests from managed hosts.
///
/// Must be safe for concurrent use: the host fetcher calls it from
/// multiple workers for different hosts at the same time.
#[cfg_attr(any(test, feature = "mockall"), mockall::automock)]
pub trait HostConnector: 'static + Send + Sync + std::fmt::Debug {
    /// Fetch the current manifest of the host at `connection`.
    ///
    /// Every error is treated as transient by the host fetcher.
    fn fetch_manifest(
        &self,
        connection: ConnectionDescriptor,
    ) -> BoxFut<'_, AtResult<HostManifest>>;
}

/// Trait-object [HostConnector].
pub type DynHostConnector = Arc<dyn HostConnector>;
