//! Flavor types: the expected values a host manifest is checked against.

use crate::*;

/// A flavor part identifier. Flavor parts are the markers that group
/// rule results in a [TrustReport](crate::TrustReport).
#[derive(
    Debug,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlavorPart {
    /// Firmware / platform measurements.
    Platform,
    /// Operating system measurements.
    Os,
    /// Asset tag provisioned on the host.
    AssetTag,
    /// Measurements unique to a single host.
    HostUnique,
    /// Application software measurements.
    Software,
    /// Legacy bios measurements.
    Bios,
}

impl FlavorPart {
    /// Every known flavor part.
    pub const ALL: [FlavorPart; 6] = [
        Self::Platform,
        Self::Os,
        Self::AssetTag,
        Self::HostUnique,
        Self::Software,
        Self::Bios,
    ];

    /// The marker string of this flavor part.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "PLATFORM",
            Self::Os => "OS",
            Self::AssetTag => "ASSET_TAG",
            Self::HostUnique => "HOST_UNIQUE",
            Self::Software => "SOFTWARE",
            Self::Bios => "BIOS",
        }
    }
}

impl AsRef<str> for FlavorPart {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for FlavorPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlavorPart {
    type Err = AtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                AtError::invalid_input(format!("unknown flavor part: {s}"))
            })
    }
}

/// Flavor description.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorDescription {
    /// The part of the host this flavor describes.
    pub flavor_part: FlavorPart,
    /// Human readable label.
    #[serde(default)]
    pub label: String,
}

/// Flavor metadata.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorMeta {
    /// Unique flavor id.
    pub id: uuid::Uuid,
    /// Flavor description.
    pub description: FlavorDescription,
    /// Vendor of the hosts this flavor applies to.
    #[serde(default)]
    pub vendor: String,
}

/// An expected PCR value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorPcr {
    /// Register index.
    pub index: u8,
    /// Digest bank.
    pub bank: DigestBank,
    /// Expected hex encoded value.
    pub value: String,
}

/// A key / value pair of an asset tag.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TagKvAttribute {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// The asset tag a host is expected to carry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTag {
    /// The tag bytes derived from the asset tag certificate.
    #[serde(with = "crate::serde_bytes_base64")]
    pub tag_bytes: bytes::Bytes,
    /// The tag attributes of the certificate.
    #[serde(default)]
    pub tags: Vec<TagKvAttribute>,
}

/// Data that comes from outside the host's own measurements.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct External {
    /// The expected asset tag.
    pub asset_tag: AssetTag,
}

/// Expected values for one flavor part of a host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavor {
    /// Flavor metadata.
    pub meta: FlavorMeta,
    /// Expected PCR values.
    #[serde(default)]
    pub pcrs: Vec<FlavorPcr>,
    /// External data, present on asset tag flavors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,
}

impl Flavor {
    /// The flavor part this flavor describes.
    pub fn flavor_part(&self) -> FlavorPart {
        self.meta.description.flavor_part
    }
}
