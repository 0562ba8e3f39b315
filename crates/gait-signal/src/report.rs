// crates/gait-signal/src/report.rs
// ============================================================================
// Module: Signal Report
// Description: Ranks families into a capped, sorted signal report with fix
//              suggestions.
// Purpose: Give an operator a short, ordered list of the incidents most
//          worth looking at first.
// Dependencies: gait-core
// ============================================================================

//! ## Overview
//! A report is a pure function of its input observations: the same
//! observations, supplied in any order, produce the same families, the same
//! ranking, and the same fix suggestions. Ranking is (severity desc, count
//! desc, family_id asc); the report is capped to the ten highest-ranked
//! families, with the number dropped recorded rather than silently discarded.

use gait_core::FamilyId;
use gait_core::RunId;

use crate::error::SignalError;
use crate::family::group_into_families;
use crate::family::Family;
use crate::observation::RunObservation;
use crate::severity::SeverityLevel;

/// Maximum number of families retained in a report's `issues` list.
const MAX_REPORTED_ISSUES: usize = 10;

/// One ranked family, enriched with fix suggestions for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalIssue {
    /// The family's identifier.
    pub family_id: FamilyId,
    /// The lexicographically first member run id.
    pub canonical_run_id: RunId,
    /// Number of runs clustered into this family.
    pub member_count: usize,
    /// `max(member base severity) + min(family_size, 10)`.
    pub severity_score: u32,
    /// `severity_score` bucketed at 70/110/150.
    pub severity_level: SeverityLevel,
    /// Most frequent reason code across the family's members.
    pub dominant_reason_code: Option<String>,
    /// Sorted, deduplicated tool classes across the family's members.
    pub driver_categories: Vec<String>,
    /// Human-readable remediation suggestions derived from
    /// `driver_categories` and `severity_level`.
    pub fix_suggestions: Vec<String>,
}

/// A capped, ranked view over every family clustered from a set of
/// observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalReport {
    /// Families ranked by (severity desc, count desc, family_id asc), capped
    /// at [`MAX_REPORTED_ISSUES`].
    pub issues: Vec<SignalIssue>,
    /// Total number of distinct families found, including any dropped by the
    /// cap.
    pub total_families: usize,
    /// Number of families dropped because the report is capped.
    pub families_omitted: usize,
}

/// Builds a signal report from a set of per-run observations.
///
/// # Errors
///
/// Returns [`SignalError::Canon`] if a member's fingerprint cannot be
/// computed.
pub fn build_report(observations: &[RunObservation]) -> Result<SignalReport, SignalError> {
    let mut families = group_into_families(observations)?;
    families.sort_by(|left, right| {
        right
            .severity_score
            .cmp(&left.severity_score)
            .then_with(|| right.members.len().cmp(&left.members.len()))
            .then_with(|| left.family_id.as_str().cmp(right.family_id.as_str()))
    });

    let total_families = families.len();
    let families_omitted = total_families.saturating_sub(MAX_REPORTED_ISSUES);

    let issues = families.into_iter().take(MAX_REPORTED_ISSUES).map(to_issue).collect();

    Ok(SignalReport { issues, total_families, families_omitted })
}

fn to_issue(family: Family) -> SignalIssue {
    let fix_suggestions = fix_suggestions_for(&family);
    SignalIssue {
        family_id: family.family_id,
        canonical_run_id: family.canonical_run_id,
        member_count: family.members.len(),
        severity_score: family.severity_score,
        severity_level: family.severity_level,
        dominant_reason_code: family.dominant_reason_code,
        driver_categories: family.driver_categories,
        fix_suggestions,
    }
}

/// Derives remediation suggestions from a family's driver categories and
/// severity level. Each matching driver category contributes its own
/// suggestion; a critical family additionally gets an escalation suggestion.
fn fix_suggestions_for(family: &Family) -> Vec<String> {
    let mut suggestions = Vec::new();
    if family.driver_categories.iter().any(|category| category == "destructive") {
        suggestions.push("add a require_approval rule for destructive tool calls matching this family's targets".to_owned());
    }
    if family.driver_categories.iter().any(|category| category == "execute") {
        suggestions.push("scope or broker credentials for executed commands in this family".to_owned());
    }
    if family.driver_categories.iter().any(|category| category == "write") {
        suggestions.push("add a dry_run rule for write operations matching this family's targets".to_owned());
    }
    if family.severity_level == SeverityLevel::Critical {
        suggestions.push("escalate for manual review before the next occurrence".to_owned());
    }
    if suggestions.is_empty() {
        suggestions.push("no automated suggestion; review the family's trace history manually".to_owned());
    }
    suggestions
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]
    use gait_core::RunId;

    use super::build_report;
    use crate::observation::RunObservation;
    use crate::severity::SeverityInputs;
    use crate::severity::SeverityLevel;

    fn observation(run_id: &str, classes: &[&str], base: SeverityInputs) -> RunObservation {
        RunObservation {
            run_id: RunId::new(run_id).expect("non-empty literal"),
            action_sequence: vec!["tool.call".to_owned()],
            tool_classes: classes.iter().map(|class| (*class).to_owned()).collect(),
            target_systems: Vec::new(),
            reason_code_vector: vec!["verdict:block".to_owned()],
            ref_receipt_digests: Vec::new(),
            severity_inputs: base,
        }
    }

    #[test]
    fn report_ranks_higher_severity_families_first() {
        let low = SeverityInputs { max_privilege: 0, target_sensitivity: 0, policy_posture: 0, reason_count: 1 };
        let high = SeverityInputs { max_privilege: 3, target_sensitivity: 3, policy_posture: 3, reason_count: 9 };
        let low_run = observation("run_low", &["read"], low);
        let high_run = observation("run_high", &["destructive"], high);
        let report = build_report(&[low_run, high_run]).expect("report builds");
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues[0].severity_score >= report.issues[1].severity_score);
        assert_eq!(report.issues[0].canonical_run_id.as_str(), "run_high");
    }

    #[test]
    fn critical_family_gets_an_escalation_suggestion() {
        let base = SeverityInputs { max_privilege: 3, target_sensitivity: 3, policy_posture: 3, reason_count: 9 };
        let run = observation("run_a", &["destructive"], base);
        let report = build_report(&[run]).expect("report builds");
        let issue = &report.issues[0];
        assert_eq!(issue.severity_level, SeverityLevel::Critical);
        assert!(issue.fix_suggestions.iter().any(|s| s.contains("escalate")));
        assert!(issue.fix_suggestions.iter().any(|s| s.contains("require_approval")));
    }

    #[test]
    fn report_caps_at_ten_issues_and_records_the_overflow() {
        let base = SeverityInputs { max_privilege: 1, target_sensitivity: 0, policy_posture: 0, reason_count: 0 };
        let observations: Vec<RunObservation> = (0..15)
            .map(|index| {
                let mut obs = observation(&format!("run_{index}"), &["write"], base);
                obs.reason_code_vector = vec![format!("reason_{index}")];
                obs
            })
            .collect();
        let report = build_report(&observations).expect("report builds");
        assert_eq!(report.total_families, 15);
        assert_eq!(report.issues.len(), 10);
        assert_eq!(report.families_omitted, 5);
    }
}
