// crates/gait-policy/src/intent.rs
// ============================================================================
// Module: Intent
// Description: The proposed tool call submitted for policy evaluation.
// Purpose: Define the typed shape PolicyGate evaluates, including the bounded
//          script-intent sub-sequence.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An intent is immutable once validated. It may carry a `script`: a bounded
//! ordered sequence of sub-intents evaluated under the same rules as a
//! top-level intent, with the script's overall verdict being the strictest
//! verdict across its sub-intents.

use serde::Deserialize;
use serde::Serialize;

/// Risk classification of an intent's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

/// A typed endpoint reference that an intent targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    /// The kind of endpoint (e.g. `filesystem`, `http`, `process`).
    pub kind: String,
    /// The endpoint's locator (path, URL, PID, ...).
    pub value: String,
    /// The operation requested against the endpoint (e.g. `read`, `write`, `delete`).
    pub operation: String,
    /// A coarser classification used by match predicates (e.g. `fs.write.system`).
    pub endpoint_class: String,
    /// Whether this operation is destructive.
    pub destructive: bool,
}

/// Strength of evidence behind a context envelope reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextEvidenceStrength {
    /// A reference to evidence that has not itself been independently verified.
    Weak,
    /// Independently verified evidence.
    Strong,
}

/// A reference to an intent's context envelope, carrying its own evidentiary
/// strength so `require_context_evidence` preconditions can be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEnvelopeRef {
    /// Content digest of the referenced context envelope.
    pub digest: String,
    /// Evidentiary strength of the referenced envelope.
    pub strength: ContextEvidenceStrength,
}

/// A single hop in a delegation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationLink {
    /// The principal granting delegated authority at this hop.
    pub principal: String,
    /// Scopes delegated at this hop.
    pub scopes: Vec<String>,
}

/// The context under which an intent is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentContext {
    /// Caller identity.
    pub identity: String,
    /// Workspace identifier the intent operates within.
    pub workspace: String,
    /// Risk classification.
    pub risk_class: RiskClass,
    /// Optional session identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Optional job identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Optional environment fingerprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_fingerprint: Option<String>,
    /// Optional delegation chain, ordered from original grantor to final delegate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_chain: Option<Vec<DelegationLink>>,
    /// Optional credential scopes already held by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_scopes: Option<Vec<String>>,
    /// Optional data classes this intent's context touches (used by
    /// `ContextDataClassIncludes` match leaves).
    #[serde(default)]
    pub data_classes: Vec<String>,
    /// Optional reference to a context envelope with supporting evidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_envelope_ref: Option<ContextEnvelopeRef>,
}

/// The proposed tool call submitted for policy evaluation.
///
/// # Invariants
/// - Immutable once validated: no operation in this crate mutates an
///   `Intent` in place.
/// - `script`, when present, is a bounded ordered sequence; `scripts.max_steps`
///   bounds its length during evaluation, not at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// The tool being invoked.
    pub tool_name: String,
    /// Opaque argument mapping for the tool call.
    pub args: serde_json::Value,
    /// Ordered set of endpoint references this intent targets.
    pub targets: Vec<TargetRef>,
    /// The context under which this intent was submitted.
    pub context: IntentContext,
    /// A bounded ordered sequence of sub-intents, when this intent is a script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Vec<Intent>>,
}

impl Intent {
    /// Returns whether this intent is a script (carries sub-intents).
    #[must_use]
    pub fn is_script(&self) -> bool {
        self.script.is_some()
    }

    /// Returns the maximum delegation chain depth reachable from this intent's context.
    #[must_use]
    pub fn delegation_depth(&self) -> usize {
        self.context.delegation_chain.as_ref().map_or(0, Vec::len)
    }
}
