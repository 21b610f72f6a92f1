//! Test utilities associated with hosts and host manifests.

use attest_api::*;

use crate::id::random_host_id;

/// A test host with a random id and a well-formed intel connection string.
pub fn test_host() -> Host {
    let id = random_host_id();
    Host {
        id,
        host_name: format!("host-{id}"),
        connection_string: "intel:https://127.0.0.1:1443;u=admin;p=password"
            .to_string(),
        description: None,
    }
}

/// A host manifest that identifies the host it was fetched from,
/// so receivers can tell manifests apart.
pub fn test_manifest(host_name: &str) -> HostManifest {
    HostManifest {
        host_info: HostInfo {
            host_name: host_name.to_string(),
            os_name: "RedHatEnterprise".to_string(),
        },
        asset_tag_digest: String::new(),
        pcr_manifest: vec![Pcr {
            index: 0,
            bank: DigestBank::Sha256,
            value: "00".repeat(32),
        }],
    }
}
