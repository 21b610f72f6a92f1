//! Compares one measured PCR against a constant expected value.

use attest_api::*;

/// Name of the [PcrMatchesConstant] rule.
pub const RULE_NAME: &str = "PcrMatchesConstant";

/// Checks that a host PCR equals an expected value. Hex comparison ignores
/// case.
#[derive(Debug, Clone)]
pub struct PcrMatchesConstant {
    expected: FlavorPcr,
    marker: FlavorPart,
}

impl PcrMatchesConstant {
    /// Construct the rule for `expected`, tagging its result with `marker`.
    pub fn new(expected: FlavorPcr, marker: FlavorPart) -> Self {
        Self { expected, marker }
    }
}

fn is_hex(s: &str) -> bool {
    !s.is_empty()
        && s.len() % 2 == 0
        && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Rule for PcrMatchesConstant {
    fn apply(&self, host_manifest: &HostManifest) -> AtResult<RuleResult> {
        let FlavorPcr { index, bank, value } = &self.expected;
        if !is_hex(value) {
            return Err(AtError::invalid_input(format!(
                "expected value of PCR {index} ({bank}) is not hex: {value}"
            )));
        }

        let result = RuleResult::new(RULE_NAME, vec![self.marker]);

        let Some(actual) = host_manifest.pcr(*index, *bank) else {
            return Ok(result.with_fault(Fault::new(
                fault_name::PCR_VALUE_MISSING,
                format!("Host PCR {index} ({bank}) is missing"),
            )));
        };

        if !actual.value.eq_ignore_ascii_case(value) {
            return Ok(result.with_fault(Fault::new(
                fault_name::PCR_VALUE_MISMATCH,
                format!(
                    "Host PCR {index} ({bank}) value {} does not match \
                     expected value {value}",
                    actual.value
                ),
            )));
        }

        Ok(result)
    }
}
