// crates/gait-policy/src/policy.rs
// ============================================================================
// Module: Policy
// Description: The declarative policy document and its verdict aggregation.
// Purpose: Define Verdict, Policy, Rule, preconditions, and match leaves.
// Dependencies: gait-match, serde
// ============================================================================

//! ## Overview
//! A policy is a flat ordered list of rules (no rule references another,
//! per the design notes' "no cyclic references"); a match predicate is a
//! [`gait_match::Predicate`] over [`MatchLeaf`] leaves.

use gait_match::Evaluate;
use gait_match::Predicate;
use serde::Deserialize;
use serde::Serialize;

use crate::intent::ContextEvidenceStrength;
use crate::intent::Intent;
use crate::intent::RiskClass;

/// The policy's decision on an intent.
///
/// # Invariants
/// - `Ord` reflects the strictest-wins aggregation order: `Block > RequireApproval
///   > DryRun > Allow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Permit the intent.
    Allow,
    /// Permit the intent but mark it as a dry run.
    DryRun,
    /// Require human approval before proceeding.
    RequireApproval,
    /// Block the intent.
    Block,
}

impl Verdict {
    /// Returns this verdict's strictness rank: higher is stricter.
    const fn rank(self) -> u8 {
        match self {
            Self::Allow => 0,
            Self::DryRun => 1,
            Self::RequireApproval => 2,
            Self::Block => 3,
        }
    }

    /// Returns the exit code for this verdict per the exit-code contract.
    /// `dry_run` shares exit code 0 with `allow` but remains a distinct tag
    /// at the structured level (see `DESIGN.md`'s Open Question decision).
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Allow | Self::DryRun => 0,
            Self::Block => 3,
            Self::RequireApproval => 4,
        }
    }

    /// Combines two verdicts by strictest-wins.
    #[must_use]
    pub fn strictest(self, other: Self) -> Self {
        if other.rank() > self.rank() { other } else { self }
    }
}

impl PartialOrd for Verdict {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Verdict {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Mode for a `require_context_evidence` precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextEvidenceMode {
    /// A context envelope with `Strong` evidence is mandatory.
    Required,
    /// A context envelope is preferred but its absence only yields a warning.
    BestEffort,
}

/// A precondition a rule may declare before its effect applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    /// A named broker credential with the given scopes must resolve.
    RequireBrokerCredential {
        /// The broker name to resolve against.
        broker: String,
        /// Scopes the resolved credential must grant.
        scopes: Vec<String>,
    },
    /// Context evidence must be present, per `mode`.
    RequireContextEvidence {
        /// Whether evidence is mandatory or best-effort.
        mode: ContextEvidenceMode,
    },
    /// A valid delegation chain must be present.
    RequireDelegation,
}

/// A leaf predicate evaluated against an [`Intent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchLeaf {
    /// Matches when the intent's tool name equals the given value.
    ToolNameIs(String),
    /// Matches when any target's endpoint class equals the given value.
    EndpointClassIs(String),
    /// Matches when the intent's risk class is at least the given value.
    RiskClassAtLeast(RiskClass),
    /// Matches when the intent's context data classes include the given value.
    ContextDataClassIncludes(String),
    /// Matches when the intent's delegation chain has at least the given depth.
    DelegationDepthAtLeast(usize),
    /// Matches when any target is marked destructive.
    HasDestructiveTarget,
}

impl Evaluate<Intent> for MatchLeaf {
    fn evaluate(&self, intent: &Intent) -> bool {
        match self {
            Self::ToolNameIs(name) => &intent.tool_name == name,
            Self::EndpointClassIs(class) => intent.targets.iter().any(|t| &t.endpoint_class == class),
            Self::RiskClassAtLeast(min) => intent.context.risk_class >= *min,
            Self::ContextDataClassIncludes(class) => intent.context.data_classes.iter().any(|c| c == class),
            Self::DelegationDepthAtLeast(min) => intent.delegation_depth() >= *min,
            Self::HasDestructiveTarget => intent.targets.iter().any(|t| t.destructive),
        }
    }
}

/// A single ordered rule in a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Rules are considered in ascending priority order.
    pub priority: i64,
    /// The verdict this rule contributes when it matches.
    pub effect: Verdict,
    /// The match predicate deciding whether this rule applies to an intent.
    pub match_predicate: Predicate<MatchLeaf>,
    /// Preconditions that must hold for this rule's effect to apply without
    /// failing closed.
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
    /// Reason codes emitted when this rule matches.
    #[serde(default)]
    pub reason_codes: Vec<String>,
    /// Violation codes emitted when this rule matches.
    #[serde(default)]
    pub violations: Vec<String>,
}

/// Per-script-intent bound on sub-intent count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLimits {
    /// Maximum number of sub-intents a script may contain.
    pub max_steps: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self { max_steps: 32 }
    }
}

/// A declarative policy document.
///
/// # Invariants
/// - `rules` is a flat ordered list; no rule references another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// The verdict applied when no rule matches.
    pub default_verdict: Verdict,
    /// Ordered rules, considered in ascending priority.
    pub rules: Vec<Rule>,
    /// Bound on script-intent sub-intent count.
    #[serde(default)]
    pub scripts: ScriptLimits,
}

/// Returns whether `strength` satisfies `mode`'s requirement.
#[must_use]
pub fn context_strength_satisfies(mode: ContextEvidenceMode, strength: Option<ContextEvidenceStrength>) -> bool {
    match (mode, strength) {
        (ContextEvidenceMode::BestEffort, _) => true,
        (ContextEvidenceMode::Required, Some(ContextEvidenceStrength::Strong)) => true,
        (ContextEvidenceMode::Required, _) => false,
    }
}

/// Parses a policy document from its TOML source text and validates it.
///
/// # Errors
///
/// Returns [`crate::error::PolicyError::MalformedDocument`] when `source` is
/// not valid TOML or does not match a [`Policy`]'s shape, or
/// [`crate::error::PolicyError::HighRiskRuleMissingBrokerPrecondition`] per
/// [`validate_policy`].
pub fn parse_policy_document(source: &str) -> Result<Policy, crate::error::PolicyError> {
    let policy: Policy =
        toml::from_str(source).map_err(|err| crate::error::PolicyError::MalformedDocument(err.to_string()))?;
    validate_policy(&policy)?;
    Ok(policy)
}

/// Validates structural policy-wide invariants that must hold before a
/// policy is ever evaluated against an intent, per the fail-closed rule
/// "a high-risk rule that lacks a declared broker precondition is rejected
/// at policy validation time, not at evaluation time". Only rules whose
/// effect is [`Verdict::Allow`] are in scope: a rule that blocks or requires
/// approval on a high-risk or destructive match is already fail-safe on its
/// own, but a rule that *permits* one needs a broker credential vouching for
/// it. "High-risk" means the match predicate examines [`RiskClass::High`]
/// (directly) or `HasDestructiveTarget` (destructive targets are load-bearing
/// for the same reason).
///
/// # Errors
///
/// Returns [`crate::error::PolicyError::HighRiskRuleMissingBrokerPrecondition`]
/// naming the first offending rule's priority.
pub fn validate_policy(policy: &Policy) -> Result<(), crate::error::PolicyError> {
    for rule in &policy.rules {
        if rule.effect != Verdict::Allow {
            continue;
        }
        let is_high_risk = rule
            .match_predicate
            .leaves()
            .into_iter()
            .any(|leaf| matches!(leaf, MatchLeaf::RiskClassAtLeast(RiskClass::High) | MatchLeaf::HasDestructiveTarget));
        let has_broker_precondition =
            rule.preconditions.iter().any(|p| matches!(p, Precondition::RequireBrokerCredential { .. }));
        if is_high_risk && !has_broker_precondition {
            return Err(crate::error::PolicyError::HighRiskRuleMissingBrokerPrecondition(rule.priority));
        }
    }
    Ok(())
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
    use super::Verdict;

    #[test]
    fn strictest_wins_ordering_matches_the_spec() {
        assert!(Verdict::Block > Verdict::RequireApproval);
        assert!(Verdict::RequireApproval > Verdict::DryRun);
        assert!(Verdict::DryRun > Verdict::Allow);
    }

    #[test]
    fn strictest_combines_to_the_stricter_verdict() {
        assert_eq!(Verdict::Allow.strictest(Verdict::Block), Verdict::Block);
        assert_eq!(Verdict::RequireApproval.strictest(Verdict::DryRun), Verdict::RequireApproval);
    }

    #[test]
    fn dry_run_and_allow_share_exit_code_zero() {
        assert_eq!(Verdict::Allow.exit_code(), 0);
        assert_eq!(Verdict::DryRun.exit_code(), 0);
    }

    #[test]
    fn parses_a_minimal_toml_policy_document() {
        let source = r#"
            default_verdict = "allow"

            [[rules]]
            priority = 10
            effect = "block"
            reason_codes = ["destructive_fs_write"]

            [rules.match_predicate.leaf]
            kind = "has_destructive_target"
        "#;
        let policy = super::parse_policy_document(source).expect("well-formed policy document parses");
        assert_eq!(policy.default_verdict, Verdict::Allow);
        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.rules[0].effect, Verdict::Block);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(super::parse_policy_document("not = [valid").is_err());
    }

    #[test]
    fn rejects_an_allow_rule_on_destructive_targets_without_broker_precondition() {
        let source = r#"
            default_verdict = "block"

            [[rules]]
            priority = 5
            effect = "allow"

            [rules.match_predicate.leaf]
            kind = "has_destructive_target"
        "#;
        let err = super::parse_policy_document(source).expect_err("high-risk allow rule must be rejected");
        assert!(matches!(err, crate::error::PolicyError::HighRiskRuleMissingBrokerPrecondition(5)));
    }

    #[test]
    fn accepts_an_allow_rule_on_destructive_targets_with_a_broker_precondition() {
        let source = r#"
            default_verdict = "block"

            [[rules]]
            priority = 5
            effect = "allow"

            [rules.match_predicate.leaf]
            kind = "has_destructive_target"

            [[rules.preconditions]]
            kind = "require_broker_credential"
            broker = "ops"
            scopes = ["destructive.write"]
        "#;
        let policy = super::parse_policy_document(source).expect("broker-gated allow rule is accepted");
        assert_eq!(policy.rules.len(), 1);
    }

    #[test]
    fn a_blocking_rule_on_destructive_targets_needs_no_broker_precondition() {
        let source = r#"
            default_verdict = "allow"

            [[rules]]
            priority = 1
            effect = "block"

            [rules.match_predicate.leaf]
            kind = "has_destructive_target"
        "#;
        assert!(super::parse_policy_document(source).is_ok());
    }
}
