//! Checks the asset tag measured on a host against the provisioned one.

use attest_api::*;
use base64::prelude::*;
use bytes::Bytes;
use sha2::{Digest, Sha384};

/// Name of the [AssetTagMatches] rule.
pub const RULE_NAME: &str = "AssetTagMatches";

/// Checks that the host manifest's asset tag digest is the SHA-384 of the
/// provisioned asset tag.
#[derive(Debug, Clone)]
pub struct AssetTagMatches {
    expected_tag: Option<Bytes>,
    tags: Vec<TagKvAttribute>,
}

impl AssetTagMatches {
    /// Construct the rule. `None` or empty `expected_tag` means no asset
    /// tag was provisioned for the host.
    pub fn new(expected_tag: Option<Bytes>, tags: Vec<TagKvAttribute>) -> Self {
        Self { expected_tag, tags }
    }

    /// Construct the rule from an asset tag flavor.
    pub fn from_flavor(flavor: &Flavor) -> Self {
        match &flavor.external {
            Some(external) => Self::new(
                Some(external.asset_tag.tag_bytes.clone()),
                external.asset_tag.tags.clone(),
            ),
            None => Self::new(None, Vec::new()),
        }
    }

    fn tag_list(&self) -> String {
        self.tags
            .iter()
            .map(|t| format!("{}={}", t.key, t.value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Rule for AssetTagMatches {
    fn apply(&self, host_manifest: &HostManifest) -> AtResult<RuleResult> {
        let result = RuleResult::new(RULE_NAME, vec![FlavorPart::AssetTag]);

        let expected_tag = match &self.expected_tag {
            Some(tag) if !tag.is_empty() => tag,
            _ => {
                return Ok(result.with_fault(Fault::new(
                    fault_name::ASSET_TAG_NOT_PROVISIONED,
                    "Asset tag is not provisioned",
                )))
            }
        };

        if host_manifest.asset_tag_digest.is_empty() {
            return Ok(result.with_fault(Fault::new(
                fault_name::ASSET_TAG_MISSING,
                "Asset tag is missing from the host manifest",
            )));
        }

        let actual = BASE64_STANDARD
            .decode(&host_manifest.asset_tag_digest)
            .map_err(|err| {
                AtError::invalid_input_src(
                    "host manifest asset tag digest is not base64",
                    err,
                )
            })?;

        if Sha384::digest(expected_tag).as_slice() != actual.as_slice() {
            return Ok(result.with_fault(Fault::new(
                fault_name::ASSET_TAG_MISMATCH,
                format!(
                    "Host asset tag does not match the provisioned tag [{}]",
                    self.tag_list()
                ),
            )));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn expected_tag() -> Bytes {
        Bytes::from_static(&[0xab; 48])
    }

    fn manifest_with_digest(asset_tag_digest: String) -> HostManifest {
        let mut host_manifest =
            attest_test_utils::host::test_manifest("tagged-host");
        host_manifest.asset_tag_digest = asset_tag_digest;
        host_manifest
    }

    fn digest_of(tag: &[u8]) -> String {
        BASE64_STANDARD.encode(Sha384::digest(tag))
    }

    fn tags() -> Vec<TagKvAttribute> {
        vec![TagKvAttribute {
            key: "Country".to_string(),
            value: "US".to_string(),
        }]
    }

    fn fault_names(result: &RuleResult) -> Vec<&str> {
        result.faults.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn not_provisioned_regardless_of_manifest() {
        let rule = AssetTagMatches::new(None, tags());
        for digest in [String::new(), digest_of(&expected_tag()), "!!".into()]
        {
            let result = rule.apply(&manifest_with_digest(digest)).unwrap();
            assert_eq!(
                vec![fault_name::ASSET_TAG_NOT_PROVISIONED],
                fault_names(&result)
            );
        }

        let rule = AssetTagMatches::new(Some(Bytes::new()), tags());
        let result = rule.apply(&manifest_with_digest(String::new())).unwrap();
        assert_eq!(
            vec![fault_name::ASSET_TAG_NOT_PROVISIONED],
            fault_names(&result)
        );
    }

    #[test]
    fn missing_from_manifest() {
        let rule = AssetTagMatches::new(Some(expected_tag()), tags());
        let result = rule.apply(&manifest_with_digest(String::new())).unwrap();
        assert_eq!(vec![fault_name::ASSET_TAG_MISSING], fault_names(&result));
    }

    #[test]
    fn mismatch() {
        let rule = AssetTagMatches::new(Some(expected_tag()), tags());
        let result = rule
            .apply(&manifest_with_digest(digest_of(&[0xcd; 48])))
            .unwrap();
        assert_eq!(vec![fault_name::ASSET_TAG_MISMATCH], fault_names(&result));
        assert!(result.faults[0].description.contains("Country=US"));
    }

    #[test]
    fn matching_digest_has_no_faults() {
        let rule = AssetTagMatches::new(Some(expected_tag()), tags());
        let result = rule
            .apply(&manifest_with_digest(digest_of(&expected_tag())))
            .unwrap();
        assert!(result.faults.is_empty());
        assert_eq!(vec![FlavorPart::AssetTag], result.rule.markers);
        assert_eq!(RULE_NAME, result.rule.name);
    }

    #[test]
    fn digest_that_is_not_base64_is_invalid_input() {
        let rule = AssetTagMatches::new(Some(expected_tag()), tags());
        let err = rule
            .apply(&manifest_with_digest("not base64!".to_string()))
            .unwrap_err();
        assert!(matches!(err, AtError::InvalidInput { .. }), "{err:?}");
    }

    #[test]
    fn from_flavor_without_external_is_not_provisioned() {
        let flavor: Flavor = serde_json::from_value(serde_json::json!({
            "meta": {
                "id": "2a0d8b5e-1f2b-4b7e-9d0a-7b8a1c3e4f50",
                "description": { "flavorPart": "ASSET_TAG", "label": "tag" },
                "vendor": "intel",
            },
        }))
        .unwrap();
        let result = AssetTagMatches::from_flavor(&flavor)
            .apply(&manifest_with_digest(digest_of(&expected_tag())))
            .unwrap();
        assert_eq!(
            vec![fault_name::ASSET_TAG_NOT_PROVISIONED],
            fault_names(&result)
        );
    }
}
