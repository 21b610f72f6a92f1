//! Verification rule traits.
//!
//! Rules are constructed with their static parameters and are pure: they
//! read their input and return a new result, never touching shared state.
//! A rule returns an error only when its input cannot be evaluated; a
//! policy deviation is reported as a [Fault] in the result.

use crate::*;
use std::sync::Arc;

/// A rule that inspects a host manifest.
pub trait Rule: 'static + Send + Sync + std::fmt::Debug {
    /// Evaluate the manifest, producing one rule result.
    fn apply(&self, host_manifest: &HostManifest) -> AtResult<RuleResult>;
}

/// Trait-object [Rule].
pub type DynRule = Arc<dyn Rule>;

/// A rule that inspects the results already gathered in a trust report.
pub trait TrustReportRule: 'static + Send + Sync + std::fmt::Debug {
    /// Evaluate the report, returning it with any new results appended.
    fn apply(&self, trust_report: TrustReport) -> AtResult<TrustReport>;
}

/// Trait-object [TrustReportRule].
pub type DynTrustReportRule = Arc<dyn TrustReportRule>;
