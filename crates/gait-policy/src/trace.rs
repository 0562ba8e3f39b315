// crates/gait-policy/src/trace.rs
// ============================================================================
// Module: Trace
// Description: The signed record PolicyGate emits for every evaluated intent.
// Purpose: Give every gate decision a durable, independently verifiable audit
//          record.
// Dependencies: gait-core, gait-signer, serde
// ============================================================================

//! ## Overview
//! A [`Trace`] never carries raw intent arguments or credential payloads; it
//! carries only digests of them, so the trace itself is safe to store and
//! transmit even when the evaluated intent touched sensitive data.

use gait_core::CorrelationId;
use gait_core::Timestamp;
use gait_core::TraceId;
use gait_signer::Signature;
use serde::Deserialize;
use serde::Serialize;

use crate::policy::Verdict;

/// Provenance of a matched pattern, when the match came from a recognized
/// skill rather than an ad hoc rule match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProvenance {
    /// Name of the skill that declared the matched pattern.
    pub skill_name: String,
    /// Version of the skill declaration.
    pub skill_version: String,
}

/// A snapshot of the delegation chain in force at evaluation time, recorded
/// for audit even though the chain itself lives on the [`crate::intent::Intent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationSnapshot {
    /// Principals in the chain, from original grantor to final delegate.
    pub principals: Vec<String>,
    /// Combined depth of the chain at evaluation time.
    pub depth: usize,
}

/// The signed record of a single PolicyGate evaluation.
///
/// # Invariants
/// - Never carries intent arguments or credential evidence payloads directly;
///   only their digests.
/// - `signature` is `None` only in `dev` signing mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Identifier for this trace.
    pub trace_id: TraceId,
    /// Caller-supplied correlation identifier, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// The tool the evaluated intent named.
    pub tool_name: String,
    /// Content digest of the intent's argument map.
    pub args_digest: String,
    /// Content digest of the full intent record.
    pub intent_digest: String,
    /// Content digest of the policy document evaluated against.
    pub policy_digest: String,
    /// Content digest of the aggregated context set at evaluation time.
    pub context_set_digest: String,
    /// The resulting verdict.
    pub verdict: Verdict,
    /// Reason codes aggregated from every rule that matched.
    pub reason_codes: Vec<String>,
    /// Violation codes aggregated from every rule that matched.
    pub violations: Vec<String>,
    /// Provenance of the matched skill, when the match originated from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_provenance: Option<SkillProvenance>,
    /// Delegation chain snapshot, when the intent carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_snapshot: Option<DelegationSnapshot>,
    /// When this trace was produced.
    pub evaluated_at: Timestamp,
    /// Signature over this trace's own canonical digest, when signing is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

/// Whether a gate result's trace carries a usable signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    /// The trace is signed and the signature is valid.
    Signed,
    /// The trace was produced under `dev` signing mode and carries no signature.
    Unsigned,
    /// The trace carries a signature but it failed verification.
    Invalid,
}

/// Which fast path, if any, produced a gate result's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrigin {
    /// The verdict came from the approved-script fast path.
    ApprovedScript,
    /// The verdict came from ordinary rule matching.
    RuleMatch,
    /// No rule matched; the policy's default verdict applied.
    Default,
}

/// The outcome of evaluating an intent against a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// The resulting verdict.
    pub verdict: Verdict,
    /// Reason codes aggregated across matched rules.
    pub reason_codes: Vec<String>,
    /// Violation codes aggregated across matched rules.
    pub violations: Vec<String>,
    /// The emitted, possibly signed, trace record.
    pub trace: Trace,
    /// Priority of the rule that produced this result, when one matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_priority: Option<i64>,
    /// Identifier of the approved-script pattern matched, when the fast path applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    /// Whether this result came from the approved-script fast path.
    pub pre_approved: bool,
    /// Which fast path, if any, produced this result.
    pub match_origin: MatchOrigin,
    /// Status of the trace's own signature.
    pub signature_status: SignatureStatus,
}

/// A single entry in an approved-script registry: a pre-approved script
/// pattern, scoped to a specific policy and expiring after `expires_at`.
///
/// # Invariants
/// - Only consulted when `policy_digest` matches the policy currently being
///   evaluated against; an entry from a superseded policy never applies.
/// - `signature` must verify against `script_digest`; an entry with an
///   invalid signature is treated as absent rather than trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedScriptEntry {
    /// Stable identifier for this approved pattern.
    pub pattern_id: String,
    /// Content digest of the approved script's ordered tool/argument sequence.
    pub script_digest: String,
    /// Content digest of the policy this approval is scoped to.
    pub policy_digest: String,
    /// When this approval expires.
    pub expires_at: Timestamp,
    /// The verdict this pattern is pre-approved to short-circuit to.
    pub verdict: Verdict,
    /// Signature over `script_digest`, required for this entry to apply.
    pub signature: Signature,
}

/// A registry of pre-approved script digests, consulted before rule matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedScriptRegistry {
    /// Registered entries.
    #[serde(default)]
    pub entries: Vec<ApprovedScriptEntry>,
}

impl ApprovedScriptRegistry {
    /// Looks up an entry approved for `script_digest` under `policy_digest`,
    /// not yet expired as of `now`. Does not itself check the entry's
    /// signature; callers must verify it before trusting the match.
    #[must_use]
    pub fn lookup(&self, script_digest: &str, policy_digest: &str, now: Timestamp) -> Option<&ApprovedScriptEntry> {
        self.entries
            .iter()
            .find(|entry| entry.script_digest == script_digest && entry.policy_digest == policy_digest && entry.expires_at > now)
    }
}
