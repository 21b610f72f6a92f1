//! Test utilities associated with ids.

use attest_api::HostId;

/// Create a random host id.
pub fn random_host_id() -> HostId {
    HostId::new_v4()
}

/// Create a list of distinct random host ids.
pub fn create_host_id_list(num_hosts: u16) -> Vec<HostId> {
    (0..num_hosts).map(|_| random_host_id()).collect()
}
