//! Trust report types.

use crate::*;

/// Symbolic fault names exposed to downstream consumers.
pub mod fault_name {
    /// A flavor part required by policy has no rule results.
    pub const REQUIRED_FLAVOR_TYPE_MISSING: &str = "RequiredFlavorTypeMissing";
    /// No asset tag was provisioned for the host.
    pub const ASSET_TAG_NOT_PROVISIONED: &str = "AssetTagNotProvisioned";
    /// The host manifest does not carry an asset tag.
    pub const ASSET_TAG_MISSING: &str = "AssetTagMissing";
    /// The host asset tag differs from the provisioned one.
    pub const ASSET_TAG_MISMATCH: &str = "AssetTagMismatch";
    /// The host manifest does not contain an expected PCR.
    pub const PCR_VALUE_MISSING: &str = "PcrValueMissing";
    /// A PCR value differs from the expected value.
    pub const PCR_VALUE_MISMATCH: &str = "PcrValueMismatch";
}

/// A named, described deviation from policy found by a rule.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fault {
    /// Symbolic name, see [fault_name].
    pub name: String,
    /// Human readable description.
    pub description: String,
}

impl Fault {
    /// Construct a new fault.
    pub fn new(name: &str, description: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            description: description.into(),
        }
    }
}

/// Identifies the rule that produced a [RuleResult].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuleInfo {
    /// Rule name.
    pub name: String,
    /// Flavor parts the result pertains to.
    pub markers: Vec<FlavorPart>,
}

/// One rule's verdict.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuleResult {
    /// The rule that produced this result.
    pub rule: RuleInfo,
    /// Faults found; empty if the rule passed.
    #[serde(default)]
    pub faults: Vec<Fault>,
}

impl RuleResult {
    /// Construct a result without faults.
    pub fn new(rule_name: &str, markers: Vec<FlavorPart>) -> Self {
        Self {
            rule: RuleInfo {
                name: rule_name.to_string(),
                markers,
            },
            faults: Vec::new(),
        }
    }

    /// Add a fault to this result.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// True if this result carries no faults.
    pub fn is_trusted(&self) -> bool {
        self.faults.is_empty()
    }

    /// True if this result is tagged with `marker`.
    pub fn has_marker(&self, marker: &str) -> bool {
        self.rule.markers.iter().any(|m| m.as_str() == marker)
    }
}

/// An ordered collection of rule results, queryable by marker.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct TrustReport {
    results: Vec<RuleResult>,
}

impl TrustReport {
    /// Construct an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. Results keep rule application order.
    pub fn add_result(&mut self, result: RuleResult) {
        self.results.push(result);
    }

    /// All results in insertion order.
    pub fn results(&self) -> &[RuleResult] {
        &self.results
    }

    /// Every result tagged with `marker`, in insertion order.
    ///
    /// Returns `None` if no result is tagged with the marker. A marker
    /// whose results all passed yields `Some` of results without faults.
    pub fn results_for_marker(
        &self,
        marker: impl AsRef<str>,
    ) -> Option<Vec<&RuleResult>> {
        let marker = marker.as_ref();
        let out: Vec<_> =
            self.results.iter().filter(|r| r.has_marker(marker)).collect();
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Iterate over every fault in the report.
    pub fn faults(&self) -> impl Iterator<Item = &Fault> {
        self.results.iter().flat_map(|r| r.faults.iter())
    }

    /// True if every required marker has at least one result without
    /// faults and no result anywhere carries a fault.
    pub fn is_trusted_for(&self, required: &[FlavorPart]) -> bool {
        self.faults().next().is_none()
            && required.iter().all(|part| {
                self.results_for_marker(part)
                    .is_some_and(|r| r.iter().any(|r| r.is_trusted()))
            })
    }

    /// True if the report has results and none of them carry a fault.
    pub fn is_trusted(&self) -> bool {
        !self.results.is_empty() && self.is_trusted_for(&[])
    }
}
