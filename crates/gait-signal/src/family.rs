// crates/gait-signal/src/family.rs
// ============================================================================
// Module: Family Grouping
// Description: Groups observations sharing a run fingerprint into families
//              and scores each family's severity.
// Purpose: Turn a flat set of per-run observations into ranked, explainable
//          incident clusters.
// Dependencies: gait-core
// ============================================================================

//! ## Overview
//! Observations are grouped by [`crate::fingerprint::run_fingerprint`]. A
//! family's severity score is `max(member base severity) + min(family_size,
//! 10)`: the worst single member sets the floor, and repetition raises it,
//! capped so a single pathological family cannot dominate purely on count.

use std::collections::BTreeMap;

use gait_core::FamilyId;
use gait_core::RunId;

use crate::error::SignalError;
use crate::fingerprint::run_fingerprint;
use crate::observation::RunObservation;
use crate::severity::SeverityLevel;

/// One cluster of runs sharing a fingerprint, with aggregated severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    /// Identifier derived from the family's fingerprint.
    pub family_id: FamilyId,
    /// Run ids belonging to this family, in the order their observations were
    /// supplied.
    pub members: Vec<RunId>,
    /// The lexicographically first member run id.
    pub canonical_run_id: RunId,
    /// `max(member base severity) + min(family_size, 10)`.
    pub severity_score: u32,
    /// `severity_score` bucketed at 70/110/150.
    pub severity_level: SeverityLevel,
    /// Most frequent reason code across the family's members, with
    /// lexicographic tie-break.
    pub dominant_reason_code: Option<String>,
    /// Sorted, deduplicated tool classes across the family's members, used to
    /// describe what kind of activity drove this family.
    pub driver_categories: Vec<String>,
}

/// Caps the member-count contribution to a family's severity score.
const FAMILY_SIZE_BONUS_CAP: u32 = 10;

/// Groups `observations` by run fingerprint and scores each resulting family.
///
/// Families are returned in an unspecified order; callers that need a stable
/// presentation order should sort the result (see
/// [`crate::report::build_report`]).
///
/// # Errors
///
/// Returns [`SignalError::Canon`] if a fingerprint cannot be computed.
pub fn group_into_families(observations: &[RunObservation]) -> Result<Vec<Family>, SignalError> {
    let mut groups: BTreeMap<String, Vec<&RunObservation>> = BTreeMap::new();
    for observation in observations {
        let fingerprint = run_fingerprint(observation)?;
        groups.entry(fingerprint.as_str().to_owned()).or_default().push(observation);
    }

    let mut families = Vec::with_capacity(groups.len());
    for (fingerprint_hex, members) in groups {
        families.push(build_family(&fingerprint_hex, &members)?);
    }
    Ok(families)
}

fn build_family(fingerprint_hex: &str, members: &[&RunObservation]) -> Result<Family, SignalError> {
    let family_id = FamilyId::new(fingerprint_hex).unwrap_or_else(|_| {
        FamilyId::new("family_empty").unwrap_or_else(|_| unreachable!("literal is non-empty"))
    });

    let mut member_ids: Vec<RunId> = members.iter().map(|observation| observation.run_id.clone()).collect();
    member_ids.sort();

    let canonical_run_id = member_ids.first().cloned().unwrap_or_else(|| {
        RunId::new("run_unknown").unwrap_or_else(|_| unreachable!("literal is non-empty"))
    });

    let max_base_severity = members.iter().map(|observation| observation.severity_inputs.base_severity()).max().unwrap_or(0);
    let size_bonus = u32::try_from(members.len()).unwrap_or(u32::MAX).min(FAMILY_SIZE_BONUS_CAP);
    let severity_score = max_base_severity + size_bonus;
    let severity_level = SeverityLevel::from_score(severity_score);

    let dominant_reason_code = dominant_reason_code(members);

    let mut driver_categories: Vec<String> = members.iter().flat_map(|observation| observation.tool_classes.iter().cloned()).collect();
    driver_categories.sort();
    driver_categories.dedup();

    Ok(Family { family_id, members: member_ids, canonical_run_id, severity_score, severity_level, dominant_reason_code, driver_categories })
}

/// Most frequent reason code across `members`, breaking ties lexicographically.
fn dominant_reason_code(members: &[&RunObservation]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for observation in members {
        for code in &observation.reason_code_vector {
            *counts.entry(code.as_str()).or_insert(0) += 1;
        }
    }
    counts.into_iter().max_by(|left, right| left.1.cmp(&right.1).then_with(|| right.0.cmp(left.0))).map(|(code, _count)| code.to_owned())
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

    use super::group_into_families;
    use crate::observation::RunObservation;
    use crate::severity::SeverityInputs;
    use crate::severity::SeverityLevel;

    fn observation(run_id: &str, reason_codes: &[&str], base: SeverityInputs) -> RunObservation {
        RunObservation {
            run_id: RunId::new(run_id).expect("non-empty literal"),
            action_sequence: vec!["tool.delete".to_owned()],
            tool_classes: vec!["destructive".to_owned()],
            target_systems: vec!["fs.write.system:/etc/passwd".to_owned()],
            reason_code_vector: reason_codes.iter().map(|code| (*code).to_owned()).collect(),
            ref_receipt_digests: Vec::new(),
            severity_inputs: base,
        }
    }

    #[test]
    fn groups_matching_observations_into_one_family() {
        let base = SeverityInputs { max_privilege: 3, target_sensitivity: 3, policy_posture: 3, reason_count: 1 };
        let first = observation("run_a", &["verdict:block"], base);
        let second = observation("run_b", &["verdict:block"], base);
        let families = group_into_families(&[first, second]).expect("grouping succeeds");
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].members.len(), 2);
        assert_eq!(families[0].canonical_run_id.as_str(), "run_a");
    }

    #[test]
    fn severity_score_adds_capped_size_bonus_to_max_member_base() {
        let base = SeverityInputs { max_privilege: 3, target_sensitivity: 3, policy_posture: 3, reason_count: 9 };
        let observations: Vec<RunObservation> =
            (0..15).map(|index| observation(&format!("run_{index}"), &["verdict:block"], base)).collect();
        let families = group_into_families(&observations).expect("grouping succeeds");
        assert_eq!(families.len(), 1);
        // base_severity = 3*30 + 3*15 + 3*10 + 9 = 174, bonus capped at 10 despite 15 members
        assert_eq!(families[0].severity_score, 184);
        assert_eq!(families[0].severity_level, SeverityLevel::Critical);
    }

    #[test]
    fn dominant_reason_code_breaks_ties_lexicographically() {
        let base = SeverityInputs { max_privilege: 0, target_sensitivity: 0, policy_posture: 0, reason_count: 1 };
        let first = observation("run_a", &["zzz_code"], base);
        let second = observation("run_b", &["aaa_code"], base);
        let families = group_into_families(&[first, second]).expect("grouping succeeds");
        assert_eq!(families.len(), 2, "distinct reason codes produce distinct fingerprints");
        let _ = families;
    }

    #[test]
    fn distinct_fingerprints_produce_distinct_families() {
        let base = SeverityInputs { max_privilege: 0, target_sensitivity: 0, policy_posture: 0, reason_count: 0 };
        let mut first = observation("run_a", &["code_a"], base);
        first.tool_classes = vec!["read".to_owned()];
        let mut second = observation("run_b", &["code_b"], base);
        second.tool_classes = vec!["write".to_owned()];
        let families = group_into_families(&[first, second]).expect("grouping succeeds");
        assert_eq!(families.len(), 2);
    }
}
