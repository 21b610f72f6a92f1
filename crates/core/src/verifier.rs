//! The trust rule engine.
//!
//! A [Verifier] turns flavors into rules, applies them to a host manifest
//! and collects the results in a [TrustReport]. Trust report rules such
//! as [RequiredFlavorPartExists] then run over the collected results.

use attest_api::*;
use std::sync::Arc;

mod asset_tag_matches;
pub use asset_tag_matches::AssetTagMatches;

mod pcr_matches_constant;
pub use pcr_matches_constant::PcrMatchesConstant;

mod required_flavor_part_exists;
pub use required_flavor_part_exists::RequiredFlavorPartExists;

/// Applies flavor derived rules to host manifests.
#[derive(Debug, Default)]
pub struct Verifier {}

impl Verifier {
    /// Construct a new verifier.
    pub fn new() -> Self {
        Self {}
    }

    /// The rules a host must pass to match `flavor`, in application order.
    ///
    /// Every flavor PCR yields a [PcrMatchesConstant] tagged with the
    /// flavor part. An asset tag flavor additionally yields an
    /// [AssetTagMatches].
    pub fn rules_for_flavor(&self, flavor: &Flavor) -> Vec<DynRule> {
        let flavor_part = flavor.flavor_part();
        let mut rules: Vec<DynRule> = flavor
            .pcrs
            .iter()
            .map(|pcr| -> DynRule {
                Arc::new(PcrMatchesConstant::new(pcr.clone(), flavor_part))
            })
            .collect();
        if flavor_part == FlavorPart::AssetTag {
            rules.push(Arc::new(AssetTagMatches::from_flavor(flavor)));
        }
        rules
    }

    /// Apply `rules` to the manifest in order, appending every result to
    /// the report.
    pub fn apply_rules(
        &self,
        mut trust_report: TrustReport,
        host_manifest: &HostManifest,
        rules: &[DynRule],
    ) -> AtResult<TrustReport> {
        for rule in rules {
            trust_report.add_result(rule.apply(host_manifest)?);
        }
        Ok(trust_report)
    }

    /// Verify the manifest against one flavor.
    pub fn verify(
        &self,
        host_manifest: &HostManifest,
        flavor: &Flavor,
    ) -> AtResult<TrustReport> {
        let rules = self.rules_for_flavor(flavor);
        let trust_report =
            self.apply_rules(TrustReport::new(), host_manifest, &rules)?;
        tracing::debug!(
            host_name = %host_manifest.host_info.host_name,
            flavor_id = %flavor.meta.id,
            flavor_part = %flavor.flavor_part(),
            faults = trust_report.faults().count(),
            "verified host manifest"
        );
        Ok(trust_report)
    }

    /// Verify the manifest against several flavors, then flag every part
    /// of `required` that none of the flavors covered.
    pub fn verify_all(
        &self,
        host_manifest: &HostManifest,
        flavors: &[Flavor],
        required: &[FlavorPart],
    ) -> AtResult<TrustReport> {
        let mut trust_report = TrustReport::new();
        for flavor in flavors {
            let rules = self.rules_for_flavor(flavor);
            trust_report =
                self.apply_rules(trust_report, host_manifest, &rules)?;
        }
        self.apply_required_flavor_types(trust_report, required)
    }

    /// Apply a [RequiredFlavorPartExists] rule for every part.
    pub fn apply_required_flavor_types(
        &self,
        mut trust_report: TrustReport,
        required: &[FlavorPart],
    ) -> AtResult<TrustReport> {
        for part in required {
            trust_report =
                RequiredFlavorPartExists::new(*part).apply(trust_report)?;
        }
        Ok(trust_report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use attest_test_utils::host::test_manifest;
    use base64::prelude::*;
    use sha2::{Digest, Sha384};

    const TAG: [u8; 4] = [0xab, 0xab, 0xab, 0xab];

    fn flavor(flavor_part: FlavorPart, pcrs: Vec<FlavorPcr>) -> Flavor {
        Flavor {
            meta: FlavorMeta {
                id: uuid::Uuid::new_v4(),
                description: FlavorDescription {
                    flavor_part,
                    label: format!("{flavor_part}-flavor"),
                },
                vendor: "intel".to_string(),
            },
            pcrs,
            external: None,
        }
    }

    fn pcr0(value: &str) -> FlavorPcr {
        FlavorPcr {
            index: 0,
            bank: DigestBank::Sha256,
            value: value.to_string(),
        }
    }

    fn asset_tag_flavor() -> Flavor {
        let mut flavor = flavor(FlavorPart::AssetTag, Vec::new());
        flavor.external = Some(External {
            asset_tag: AssetTag {
                tag_bytes: bytes::Bytes::from_static(&TAG),
                tags: Vec::new(),
            },
        });
        flavor
    }

    fn tagged_manifest() -> HostManifest {
        let mut host_manifest = test_manifest("h");
        host_manifest.asset_tag_digest =
            BASE64_STANDARD.encode(Sha384::digest(TAG));
        host_manifest
    }

    #[test]
    fn rules_follow_flavor() {
        let verifier = Verifier::new();
        let platform =
            flavor(FlavorPart::Platform, vec![pcr0("00"), pcr0("11")]);
        assert_eq!(2, verifier.rules_for_flavor(&platform).len());
        assert_eq!(1, verifier.rules_for_flavor(&asset_tag_flavor()).len());
    }

    #[test]
    fn matching_platform_flavor_is_trusted() {
        let verifier = Verifier::new();
        let report = verifier
            .verify(
                &test_manifest("h"),
                &flavor(FlavorPart::Platform, vec![pcr0(&"00".repeat(32))]),
            )
            .unwrap();
        assert!(report.is_trusted());
        assert!(report.is_trusted_for(&[FlavorPart::Platform]));
        assert!(!report.is_trusted_for(&[FlavorPart::Os]));
    }

    #[test]
    fn faults_keep_rule_order() {
        let verifier = Verifier::new();
        let mut missing = pcr0("00");
        missing.index = 7;
        let report = verifier
            .verify(
                &test_manifest("h"),
                &flavor(FlavorPart::Os, vec![pcr0("ff"), missing]),
            )
            .unwrap();
        let names: Vec<_> = report.faults().map(|f| f.name.as_str()).collect();
        assert_eq!(
            vec![fault_name::PCR_VALUE_MISMATCH, fault_name::PCR_VALUE_MISSING],
            names
        );
        assert_eq!(2, report.results_for_marker(FlavorPart::Os).unwrap().len());
    }

    #[test]
    fn asset_tag_verdicts() {
        let verifier = Verifier::new();
        let report = verifier
            .verify(&tagged_manifest(), &asset_tag_flavor())
            .unwrap();
        assert!(report.is_trusted_for(&[FlavorPart::AssetTag]));

        let report = verifier
            .verify(&test_manifest("h"), &asset_tag_flavor())
            .unwrap();
        let faults: Vec<_> = report.faults().collect();
        assert_eq!(1, faults.len());
        assert_eq!(fault_name::ASSET_TAG_MISSING, faults[0].name);

        let mut no_external = asset_tag_flavor();
        no_external.external = None;
        let report =
            verifier.verify(&tagged_manifest(), &no_external).unwrap();
        assert_eq!(
            fault_name::ASSET_TAG_NOT_PROVISIONED,
            report.faults().next().unwrap().name
        );
    }

    #[test]
    fn rule_error_aborts_verification() {
        let verifier = Verifier::new();
        let err = verifier
            .verify(
                &test_manifest("h"),
                &flavor(FlavorPart::Platform, vec![pcr0("not hex")]),
            )
            .unwrap_err();
        assert!(matches!(err, AtError::InvalidInput { .. }));
    }

    #[test]
    fn required_parts_are_flagged_once() {
        let verifier = Verifier::new();
        let flavors = [
            flavor(FlavorPart::Platform, vec![pcr0(&"00".repeat(32))]),
            asset_tag_flavor(),
        ];
        let required =
            [FlavorPart::Platform, FlavorPart::AssetTag, FlavorPart::Os];

        let report = verifier
            .verify_all(&tagged_manifest(), &flavors, &required)
            .unwrap();
        let faults: Vec<_> = report.faults().collect();
        assert_eq!(1, faults.len());
        assert_eq!(fault_name::REQUIRED_FLAVOR_TYPE_MISSING, faults[0].name);
        assert!(!report.is_trusted_for(&required));

        let again = verifier
            .apply_required_flavor_types(report.clone(), &required)
            .unwrap();
        assert_eq!(report, again);
    }
}
