// crates/gait-regress/src/grader.rs
// ============================================================================
// Module: Graders
// Description: The four dimensions a regression run is checked against:
//              content, reference receipts, context envelope, signatures.
// Purpose: Let each dimension classify drift independently while sharing one
//          dispatch shape.
// Dependencies: gait-canon
// ============================================================================

//! ## Overview
//! `Grader` is the second of the crate family's two dynamic-dispatch points:
//! a `Vec<Box<dyn Grader>>` built fresh for each [`crate::run::run`] call,
//! in a fixed order, with no registration system. Each grader is
//! constructed with the configuration (allow-list, thresholds) it needs
//! rather than receiving it as a per-call argument.

use crate::normalize::NormalizedRunpack;
use crate::thresholds::ContextDriftThresholds;

/// Pass/fail outcome of a single grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraderStatus {
    /// The grader found no disqualifying drift.
    Pass,
    /// The grader found drift it does not tolerate.
    Fail,
}

/// Result of running one grader over a fixture/candidate pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraderResult {
    /// The grader's stable name.
    pub name: String,
    /// Pass/fail outcome.
    pub status: GraderStatus,
    /// Reason codes explaining a failure; empty on pass.
    pub reason_codes: Vec<String>,
    /// Human-readable detail, including a `run_id` tag when available.
    pub details: String,
}

/// One dimension of fixture-vs-candidate comparison.
pub trait Grader {
    /// Grades a fixture/candidate pair, returning this dimension's result.
    fn grade(&self, fixture: &NormalizedRunpack, candidate: &NormalizedRunpack) -> GraderResult;
}

/// Members content grading considers; everything except receipts, context,
/// and signature, which have their own dedicated graders.
const CONTENT_MEMBERS: [&str; 3] = ["run.json", "intents.jsonl", "results.jsonl"];

/// Compares the core run evidence members.
pub struct ContentGrader {
    /// Member names permitted to vary without failing this grader.
    pub allow_list: Vec<String>,
    /// Tag included in this grader's detail string.
    pub run_id_tag: String,
}

impl Grader for ContentGrader {
    fn grade(&self, fixture: &NormalizedRunpack, candidate: &NormalizedRunpack) -> GraderResult {
        let mut reason_codes = Vec::new();
        for member in CONTENT_MEMBERS {
            if self.allow_list.iter().any(|allowed| allowed == member) {
                continue;
            }
            if fixture.member_differs(candidate, member) {
                reason_codes.push(format!("content_drift:{member}"));
            }
        }
        reason_codes.sort();
        let status = if reason_codes.is_empty() { GraderStatus::Pass } else { GraderStatus::Fail };
        GraderResult {
            name: "content".to_owned(),
            status,
            reason_codes,
            details: format!("run_id={}", self.run_id_tag),
        }
    }
}

/// Compares external reference receipts (`refs.json`).
pub struct ReceiptsGrader {
    /// Member names permitted to vary without failing this grader.
    pub allow_list: Vec<String>,
    /// Tag included in this grader's detail string.
    pub run_id_tag: String,
}

impl Grader for ReceiptsGrader {
    fn grade(&self, fixture: &NormalizedRunpack, candidate: &NormalizedRunpack) -> GraderResult {
        let mut reason_codes = Vec::new();
        let allowed = self.allow_list.iter().any(|allowed| allowed == "refs.json");
        if !allowed && fixture.member_differs(candidate, "refs.json") {
            reason_codes.push("receipts_drift:refs.json".to_owned());
        }
        let status = if reason_codes.is_empty() { GraderStatus::Pass } else { GraderStatus::Fail };
        GraderResult {
            name: "receipts".to_owned(),
            status,
            reason_codes,
            details: format!("run_id={}", self.run_id_tag),
        }
    }
}

/// Compares the context envelope, classifying drift via
/// [`ContextDriftThresholds`] rather than failing on any difference.
pub struct ContextGrader {
    /// Member names permitted to vary without failing this grader.
    pub allow_list: Vec<String>,
    /// Thresholds bounding what counts as additive (tolerated) drift.
    pub thresholds: ContextDriftThresholds,
    /// Tag included in this grader's detail string.
    pub run_id_tag: String,
}

impl ContextGrader {
    /// Classifies every top-level key that differs between the two
    /// envelopes, returning the keys whose change is not covered by the
    /// additive-key-prefix allowance.
    fn non_additive_changed_keys(
        &self,
        fixture_value: &serde_json::Value,
        candidate_value: &serde_json::Value,
    ) -> Vec<String> {
        let (Some(fixture_map), Some(candidate_map)) = (fixture_value.as_object(), candidate_value.as_object())
        else {
            return vec!["<root>".to_owned()];
        };
        let mut keys: std::collections::BTreeSet<String> = fixture_map.keys().cloned().collect();
        keys.extend(candidate_map.keys().cloned());

        keys.into_iter()
            .filter(|key| fixture_map.get(key) != candidate_map.get(key))
            .filter(|key| !self.thresholds.is_additive_key(key))
            .collect()
    }
}

impl Grader for ContextGrader {
    fn grade(&self, fixture: &NormalizedRunpack, candidate: &NormalizedRunpack) -> GraderResult {
        const MEMBER: &str = "context_envelope.json";
        let allowed = self.allow_list.iter().any(|allowed| allowed == MEMBER);

        let mut reason_codes = Vec::new();
        if fixture.member_differs(candidate, MEMBER) && !allowed {
            let fixture_bytes = fixture.members.get(MEMBER);
            let candidate_bytes = candidate.members.get(MEMBER);
            match (fixture_bytes, candidate_bytes) {
                (Some(fixture_bytes), Some(candidate_bytes)) => {
                    let fixture_value: Result<serde_json::Value, _> = serde_json::from_slice(fixture_bytes);
                    let candidate_value: Result<serde_json::Value, _> = serde_json::from_slice(candidate_bytes);
                    match (fixture_value, candidate_value) {
                        (Ok(fixture_value), Ok(candidate_value)) => {
                            let non_additive = self.non_additive_changed_keys(&fixture_value, &candidate_value);
                            if !non_additive.is_empty() {
                                reason_codes.push("context_drift:semantic".to_owned());
                            }
                        }
                        _ => reason_codes.push("context_drift:unparseable".to_owned()),
                    }
                }
                _ => reason_codes.push("context_drift:member_presence_changed".to_owned()),
            }
        }
        reason_codes.sort();
        let status = if reason_codes.is_empty() { GraderStatus::Pass } else { GraderStatus::Fail };
        GraderResult {
            name: "context".to_owned(),
            status,
            reason_codes,
            details: format!("run_id={}", self.run_id_tag),
        }
    }
}

/// Compares the manifest signature member (`signature.json`).
pub struct SignaturesGrader {
    /// Member names permitted to vary without failing this grader.
    pub allow_list: Vec<String>,
    /// Tag included in this grader's detail string.
    pub run_id_tag: String,
}

impl Grader for SignaturesGrader {
    fn grade(&self, fixture: &NormalizedRunpack, candidate: &NormalizedRunpack) -> GraderResult {
        const MEMBER: &str = "signature.json";
        let allowed = self.allow_list.iter().any(|allowed| allowed == MEMBER);
        let mut reason_codes = Vec::new();
        if !allowed && fixture.member_differs(candidate, MEMBER) {
            reason_codes.push("signature_drift:signature.json".to_owned());
        }
        let status = if reason_codes.is_empty() { GraderStatus::Pass } else { GraderStatus::Fail };
        GraderResult {
            name: "signatures".to_owned(),
            status,
            reason_codes,
            details: format!("run_id={}", self.run_id_tag),
        }
    }
}
