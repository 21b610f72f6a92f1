//! Host, host manifest and host status types.

use crate::*;

/// A managed host whose attestation evidence can be fetched.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Unique host id.
    pub id: HostId,

    /// Human readable host name.
    pub host_name: String,

    /// Protocol / address / credential bundle,
    /// see [ConnectionDescriptor](crate::ConnectionDescriptor).
    pub connection_string: String,

    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Digest bank of a platform configuration register.
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
pub enum DigestBank {
    /// SHA-1 bank.
    #[serde(rename = "SHA1")]
    Sha1,
    /// SHA-256 bank.
    #[serde(rename = "SHA256")]
    Sha256,
    /// SHA-384 bank.
    #[serde(rename = "SHA384")]
    Sha384,
}

impl std::fmt::Display for DigestBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
        })
    }
}

/// A measured platform configuration register value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pcr {
    /// Register index.
    pub index: u8,
    /// Digest bank.
    pub bank: DigestBank,
    /// Hex encoded register value.
    pub value: String,
}

/// Descriptive information reported by the host.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(default, rename_all = "camelCase")]
pub struct HostInfo {
    /// Host name reported by the host itself.
    pub host_name: String,
    /// Operating system name.
    pub os_name: String,
}

/// Evidence retrieved from a managed host representing its current
/// measured state.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(default, rename_all = "camelCase")]
pub struct HostManifest {
    /// Host information.
    pub host_info: HostInfo,

    /// Base64 encoded asset tag digest read from the host.
    /// Empty if the host has no asset tag provisioned.
    pub asset_tag_digest: String,

    /// Measured PCR values.
    pub pcr_manifest: Vec<Pcr>,
}

impl HostManifest {
    /// Look up a PCR value by index and bank.
    pub fn pcr(&self, index: u8, bank: DigestBank) -> Option<&Pcr> {
        self.pcr_manifest
            .iter()
            .find(|p| p.index == index && p.bank == bank)
    }
}

/// Connection state of a host.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostState {
    /// The last fetch succeeded.
    Connected,
    /// The last fetch failed, or the host has not been reached yet.
    Unknown,
    /// A fetch is queued.
    #[serde(rename = "QUEUE")]
    Queued,
    /// A fetch is in progress.
    Connecting,
}

/// Status record written after every fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    /// The host this status describes.
    pub host_id: HostId,

    /// Connection state.
    pub host_state: HostState,

    /// Time of the fetch attempt.
    pub last_time_connected: Timestamp,

    /// The manifest retrieved by a successful fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_manifest: Option<HostManifest>,
}

impl HostStatus {
    /// Status record for a successful fetch.
    pub fn connected(host_id: HostId, host_manifest: HostManifest) -> Self {
        Self {
            host_id,
            host_state: HostState::Connected,
            last_time_connected: Timestamp::now(),
            host_manifest: Some(host_manifest),
        }
    }

    /// Status record for a failed fetch.
    pub fn unknown(host_id: HostId) -> Self {
        Self {
            host_id,
            host_state: HostState::Unknown,
            last_time_connected: Timestamp::now(),
            host_manifest: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_state_wire_names() {
        assert_eq!(
            "\"CONNECTED\"",
            serde_json::to_string(&HostState::Connected).unwrap()
        );
        assert_eq!(
            "\"UNKNOWN\"",
            serde_json::to_string(&HostState::Unknown).unwrap()
        );
        assert_eq!(
            "\"QUEUE\"",
            serde_json::to_string(&HostState::Queued).unwrap()
        );
        assert_eq!(
            "\"CONNECTING\"",
            serde_json::to_string(&HostState::Connecting).unwrap()
        );
    }

    #[test]
    fn unknown_status_carries_no_manifest() {
        let status = HostStatus::unknown(HostId::new_v4());
        assert_eq!(HostState::Unknown, status.host_state);
        assert!(status.host_manifest.is_none());

        let enc = serde_json::to_value(&status).unwrap();
        assert!(enc.get("hostManifest").is_none());
    }

    #[test]
    fn pcr_lookup_matches_index_and_bank() {
        let manifest = HostManifest {
            pcr_manifest: vec![
                Pcr {
                    index: 0,
                    bank: DigestBank::Sha1,
                    value: "aa".into(),
                },
                Pcr {
                    index: 0,
                    bank: DigestBank::Sha256,
                    value: "bb".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!("bb", manifest.pcr(0, DigestBank::Sha256).unwrap().value);
        assert!(manifest.pcr(1, DigestBank::Sha256).is_none());
    }
}
