//! Types dealing with host identity.

macro_rules! imp_deref {
    ($i:ty, $t:ty) => {
        impl std::ops::Deref for $i {
            type Target = $t;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

macro_rules! imp_from {
    ($a:ty, $b:ty, $i:ident => $e:expr) => {
        impl From<$b> for $a {
            fn from($i: $b) -> Self {
                $e
            }
        }
    };
}

/// Identifies a managed host.
///
/// This is the key of the host fetcher's pending work map, so every
/// request for the same host id is coalesced into one network fetch.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct HostId(pub uuid::Uuid);

imp_deref!(HostId, uuid::Uuid);
imp_from!(HostId, uuid::Uuid, u => HostId(u));
imp_from!(uuid::Uuid, HostId, h => h.0);

impl HostId {
    /// Generate a new random host id.
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Debug for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HostId(")?;
        std::fmt::Display::fmt(&self.0, f)?;
        f.write_str(")")
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for HostId {
    type Err = crate::AtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(HostId)
            .map_err(|e| crate::AtError::invalid_input_src("host id", e))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_id_display_is_hyphenated_uuid() {
        let id: HostId = "7f8e6c2a-3b4d-4e5f-8a9b-0c1d2e3f4a5b".parse().unwrap();
        assert_eq!("7f8e6c2a-3b4d-4e5f-8a9b-0c1d2e3f4a5b", id.to_string());
        assert_eq!(
            "HostId(7f8e6c2a-3b4d-4e5f-8a9b-0c1d2e3f4a5b)",
            format!("{id:?}")
        );
    }

    #[test]
    fn host_id_rejects_garbage() {
        assert!(matches!(
            "not-a-uuid".parse::<HostId>(),
            Err(crate::AtError::InvalidInput { .. })
        ));
    }

    #[test]
    fn host_id_serializes_transparently() {
        let id = HostId::new_v4();
        let enc = serde_json::to_string(&id).unwrap();
        assert_eq!(format!("\"{id}\""), enc);
    }
}
