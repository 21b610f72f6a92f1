//! Flags flavor parts that policy requires but no rule reported on.

use attest_api::*;

/// Name of the [RequiredFlavorPartExists] rule.
pub const RULE_NAME: &str = "RequiredFlavorPartExists";

/// Appends a [fault_name::REQUIRED_FLAVOR_TYPE_MISSING] result for its flavor
/// part if the report holds no result tagged with that part.
///
/// Applying the rule to a report it has already updated is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct RequiredFlavorPartExists {
    flavor_part: FlavorPart,
}

impl RequiredFlavorPartExists {
    /// Construct the rule for `flavor_part`.
    pub fn new(flavor_part: FlavorPart) -> Self {
        Self { flavor_part }
    }
}

impl TrustReportRule for RequiredFlavorPartExists {
    fn apply(&self, mut trust_report: TrustReport) -> AtResult<TrustReport> {
        if trust_report.results_for_marker(self.flavor_part).is_none() {
            trust_report.add_result(
                RuleResult::new(RULE_NAME, vec![self.flavor_part]).with_fault(
                    Fault::new(
                        fault_name::REQUIRED_FLAVOR_TYPE_MISSING,
                        format!(
                            "Required flavor type missing: {}",
                            self.flavor_part
                        ),
                    ),
                ),
            );
        }
        Ok(trust_report)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn passing(part: FlavorPart) -> RuleResult {
        RuleResult::new("PcrMatchesConstant", vec![part])
    }

    #[test]
    fn missing_part_is_flagged() {
        let mut report = TrustReport::new();
        report.add_result(passing(FlavorPart::Platform));

        let report = RequiredFlavorPartExists::new(FlavorPart::Os)
            .apply(report)
            .unwrap();

        let os = report.results_for_marker(FlavorPart::Os).unwrap();
        assert_eq!(1, os.len());
        assert_eq!(1, os[0].faults.len());
        assert_eq!(
            fault_name::REQUIRED_FLAVOR_TYPE_MISSING,
            os[0].faults[0].name
        );
        assert_eq!(
            "Required flavor type missing: OS",
            os[0].faults[0].description
        );
        assert!(!report.is_trusted());
    }

    #[test]
    fn present_part_is_untouched() {
        let mut report = TrustReport::new();
        report.add_result(passing(FlavorPart::Bios));
        let before = report.clone();

        let report = RequiredFlavorPartExists::new(FlavorPart::Bios)
            .apply(report)
            .unwrap();
        assert_eq!(before, report);
    }

    #[test]
    fn present_part_with_faults_is_untouched() {
        let mut report = TrustReport::new();
        report.add_result(passing(FlavorPart::Bios).with_fault(Fault::new(
            fault_name::PCR_VALUE_MISMATCH,
            "PCR 0 mismatch",
        )));
        let before = report.clone();

        let report = RequiredFlavorPartExists::new(FlavorPart::Bios)
            .apply(report)
            .unwrap();
        assert_eq!(before, report);
    }

    #[test]
    fn idempotent() {
        let rule = RequiredFlavorPartExists::new(FlavorPart::AssetTag);
        let once = rule.apply(TrustReport::new()).unwrap();
        let twice = rule.apply(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(1, twice.faults().count());
    }
}
