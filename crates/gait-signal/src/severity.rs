// crates/gait-signal/src/severity.rs
// ============================================================================
// Module: Severity Scoring
// Description: Per-observation severity inputs and the family severity
//              formula named in the spec.
// Purpose: Give every family a deterministic, explainable severity score and
//          bucketed level rather than an opaque single number.
// Dependencies: none (pure)
// ============================================================================

//! ## Overview
//! `base_severity = max_privilege*30 + target_sensitivity*15 +
//! policy_posture*10 + min(reason_count, 9)`, and a family's score is
//! `max(member base severity) + min(family_size, 10)`. The three weighted
//! inputs are derived deterministically from an observation's tool classes,
//! target systems, and trace verdicts so two observations built from
//! identical evidence always score identically.

use crate::observation::TraceContribution;

/// Severity level a family's score is bucketed into, at 70/110/150.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    /// Score below 70.
    Low,
    /// Score in `[70, 110)`.
    Medium,
    /// Score in `[110, 150)`.
    High,
    /// Score at or above 150.
    Critical,
}

/// Lower bound of [`SeverityLevel::Medium`].
pub const MEDIUM_THRESHOLD: u32 = 70;
/// Lower bound of [`SeverityLevel::High`].
pub const HIGH_THRESHOLD: u32 = 110;
/// Lower bound of [`SeverityLevel::Critical`].
pub const CRITICAL_THRESHOLD: u32 = 150;

impl SeverityLevel {
    /// Buckets a severity score into its level.
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        if score >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// The weighted inputs `base_severity` is computed from for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityInputs {
    /// Highest privilege tier among this observation's tool classes: 3 for
    /// `destructive`, 2 for `execute`, 1 for `write`, 0 otherwise.
    pub max_privilege: u32,
    /// Sensitivity tier of this observation's target systems: 3 when any
    /// target's endpoint class marks a system surface, 2 for a write surface,
    /// 1 when targets are present but neither, 0 when there are none.
    pub target_sensitivity: u32,
    /// Strictness tier of this observation's trace verdicts: 3 for `block`,
    /// 2 for `require_approval`, 1 for `dry_run`, 0 for `allow` or absence.
    pub policy_posture: u32,
    /// Number of distinct reason codes this observation carries.
    pub reason_count: usize,
}

impl SeverityInputs {
    /// Derives severity inputs from an observation's already-computed tool
    /// classes and target systems, plus the raw trace contributions (trace
    /// verdicts are not retained on [`crate::observation::RunObservation`]
    /// itself, only folded into its reason-code vector, so posture is derived
    /// here from the same contributions before that fold discards their tags).
    #[must_use]
    pub fn derive(
        tool_classes: &[String],
        target_systems: &[String],
        traces: &[TraceContribution],
        reason_count: usize,
    ) -> Self {
        let max_privilege = if tool_classes.iter().any(|class| class == "destructive") {
            3
        } else if tool_classes.iter().any(|class| class == "execute") {
            2
        } else if tool_classes.iter().any(|class| class == "write") {
            1
        } else {
            0
        };

        let target_sensitivity = if target_systems.iter().any(|target| target.contains("system")) {
            3
        } else if target_systems.iter().any(|target| target.contains("write")) {
            2
        } else if !target_systems.is_empty() {
            1
        } else {
            0
        };

        let policy_posture = traces
            .iter()
            .map(|trace| match trace.verdict_tag.as_str() {
                "verdict:block" => 3,
                "verdict:require_approval" => 2,
                "verdict:dry_run" => 1,
                _ => 0,
            })
            .max()
            .unwrap_or(0);

        Self { max_privilege, target_sensitivity, policy_posture, reason_count }
    }

    /// Computes `base_severity` for one observation.
    #[must_use]
    pub fn base_severity(&self) -> u32 {
        let reason_component = u32::try_from(self.reason_count.min(9)).unwrap_or(9);
        self.max_privilege * 30 + self.target_sensitivity * 15 + self.policy_posture * 10 + reason_component
    }
}
