// crates/gait-signal/src/fingerprint.rs
// ============================================================================
// Module: Run Fingerprint
// Description: The canonical digest over an observation's clustering fields.
// Purpose: Give every run a stable identity for family grouping, independent
//          of run id, timestamps, or argument values.
// Dependencies: gait-canon
// ============================================================================

//! ## Overview
//! Two runs with identical action sequences, tool classes, target systems,
//! reason codes, and ref receipt digests always fingerprint identically,
//! regardless of their own run ids or when they were produced — this is what
//! lets [`crate::family::group_into_families`] cluster unrelated runs that
//! hit the same underlying issue.

use gait_canon::Digest;

use crate::error::SignalError;
use crate::observation::RunObservation;

/// The fields a run fingerprint is computed over, projected out of a
/// [`RunObservation`] so the fingerprint excludes `run_id` and
/// `severity_inputs`.
#[derive(serde::Serialize)]
struct FingerprintInput<'a> {
    action_sequence: &'a [String],
    tool_classes: &'a [String],
    target_systems: &'a [String],
    reason_code_vector: &'a [String],
    ref_receipt_digests: &'a [String],
}

/// Computes the deterministic run fingerprint for `observation`.
///
/// # Errors
///
/// Returns [`SignalError::Canon`] if the projection cannot be canonicalized
/// (unreachable in practice: every field is a plain string vector).
pub fn run_fingerprint(observation: &RunObservation) -> Result<Digest, SignalError> {
    let projection = FingerprintInput {
        action_sequence: &observation.action_sequence,
        tool_classes: &observation.tool_classes,
        target_systems: &observation.target_systems,
        reason_code_vector: &observation.reason_code_vector,
        ref_receipt_digests: &observation.ref_receipt_digests,
    };
    Ok(gait_canon::digest(&projection)?)
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

    use super::run_fingerprint;
    use crate::observation::RunObservation;
    use crate::severity::SeverityInputs;

    fn sample_observation(run_id: &str) -> RunObservation {
        RunObservation {
            run_id: RunId::new(run_id).expect("non-empty literal"),
            action_sequence: vec!["tool.delete".to_owned()],
            tool_classes: vec!["destructive".to_owned()],
            target_systems: vec!["fs.write.system:/etc/passwd".to_owned()],
            reason_code_vector: vec!["verdict:block".to_owned()],
            ref_receipt_digests: Vec::new(),
            severity_inputs: SeverityInputs { max_privilege: 3, target_sensitivity: 3, policy_posture: 3, reason_count: 1 },
        }
    }

    #[test]
    fn identical_clustering_fields_fingerprint_identically_regardless_of_run_id() {
        let left = sample_observation("run_a");
        let right = sample_observation("run_b");
        assert_eq!(
            run_fingerprint(&left).expect("left fingerprints"),
            run_fingerprint(&right).expect("right fingerprints"),
        );
    }

    #[test]
    fn differing_reason_codes_fingerprint_differently() {
        let mut other = sample_observation("run_a");
        other.reason_code_vector = vec!["verdict:allow".to_owned()];
        let left = sample_observation("run_a");
        assert_ne!(run_fingerprint(&left).expect("left fingerprints"), run_fingerprint(&other).expect("other fingerprints"));
    }
}
