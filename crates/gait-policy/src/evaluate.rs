// crates/gait-policy/src/evaluate.rs
// ============================================================================
// Module: Evaluate
// Description: The PolicyGate evaluation algorithm.
// Purpose: Turn an intent and a policy into a deterministic, signed verdict.
// Dependencies: gait-broker, gait-canon, gait-core, gait-match, gait-signer
// ============================================================================

//! ## Overview
//! Evaluation runs in the fixed order laid out by the component design:
//! precondition checks (always fail-closed to [`Verdict::Block`]), the
//! approved-script fast path, priority-ordered rule matching, script-intent
//! recursion bounded by `policy.scripts.max_steps`, reason/violation
//! aggregation, and finally trace emission and signing — in that order, so
//! nothing about a trace's content can change after its signature is taken.

use gait_broker::CredentialBroker;
use gait_core::Clock;
use gait_core::CorrelationId;
use gait_core::TraceId;
use gait_signer::SigningMode;
use gait_signer::VerifyOutcome;

use crate::error::PolicyError;
use crate::intent::Intent;
use crate::policy::context_strength_satisfies;
use crate::policy::Policy;
use crate::policy::Precondition;
use crate::policy::Verdict;
use crate::trace::ApprovedScriptRegistry;
use crate::trace::GateResult;
use crate::trace::MatchOrigin;
use crate::trace::SignatureStatus;
use crate::trace::Trace;

/// Reason code: the intent's context envelope reference is missing or too
/// weak for a `require_context_evidence` precondition.
pub const CONTEXT_EVIDENCE_MISSING: &str = "context_evidence_missing";
/// Reason code: a `require_delegation` precondition found no valid chain.
pub const DELEGATION_MISSING: &str = "delegation_missing";
/// Reason code: a `require_broker_credential` precondition could not resolve.
pub const BROKER_CREDENTIAL_MISSING: &str = "broker_credential_missing";
/// Reason code: an approved-script registry entry's signature did not verify.
pub const APPROVED_SCRIPT_SIGNATURE_INVALID: &str = "approved_script_signature_invalid";
/// Reason code: the approved-script fast path applied.
pub const APPROVED_SCRIPT_MATCH: &str = "approved_script_match";
/// Reason code: no rule matched and the policy's default verdict applied.
pub const DEFAULT_VERDICT_APPLIED: &str = "default_verdict_applied";
/// Violation code: a script intent's sub-intent count exceeds `scripts.max_steps`.
pub const SCRIPT_MAX_STEPS_EXCEEDED: &str = "script_max_steps_exceeded";

/// Configuration fixed for the lifetime of a gate: signing posture, key
/// material, and the public key approved-script entries are verified against.
pub struct GateConfig<'a> {
    /// Signing mode applied to every trace this gate emits.
    pub signing_mode: SigningMode,
    /// Signing key used when `signing_mode` calls for a signature.
    pub private_key: Option<&'a ed25519_dalek::SigningKey>,
    /// Public key approved-script registry entries are verified against.
    pub approved_script_key: Option<&'a ed25519_dalek::VerifyingKey>,
}

struct Aggregate {
    verdict: Verdict,
    reason_codes: Vec<String>,
    violations: Vec<String>,
    matched_rule_priority: Option<i64>,
}

impl Aggregate {
    fn blocked(reason_or_violation: &str, as_violation: bool) -> Self {
        let mut aggregate =
            Self { verdict: Verdict::Block, reason_codes: Vec::new(), violations: Vec::new(), matched_rule_priority: None };
        if as_violation {
            aggregate.violations.push(reason_or_violation.to_owned());
        } else {
            aggregate.reason_codes.push(reason_or_violation.to_owned());
        }
        aggregate
    }
}

/// Checks a single rule's preconditions, returning the reason code for the
/// first one that fails to hold, if any.
fn first_failing_precondition(
    preconditions: &[Precondition],
    intent: &Intent,
    broker: &dyn CredentialBroker,
) -> Option<&'static str> {
    for precondition in preconditions {
        let holds = match precondition {
            Precondition::RequireBrokerCredential { broker: name, scopes } => broker
                .resolve(name, scopes)
                .is_ok_and(|evidence| scopes.iter().all(|scope| evidence.scopes.contains(scope))),
            Precondition::RequireContextEvidence { mode } => context_strength_satisfies(
                *mode,
                intent.context.context_envelope_ref.as_ref().map(|envelope| envelope.strength),
            ),
            Precondition::RequireDelegation => {
                intent.context.delegation_chain.as_ref().is_some_and(|chain| !chain.is_empty())
            }
        };
        if !holds {
            return Some(match precondition {
                Precondition::RequireBrokerCredential { .. } => BROKER_CREDENTIAL_MISSING,
                Precondition::RequireContextEvidence { .. } => CONTEXT_EVIDENCE_MISSING,
                Precondition::RequireDelegation => DELEGATION_MISSING,
            });
        }
    }
    None
}

/// Matches `intent` against `policy`'s rules in ascending priority order.
/// Rules sharing the lowest priority at which any rule matches are combined
/// by strictest-wins; priority levels below the first match are not
/// consulted, mirroring a first-match-wins firewall rule list.
fn match_rules(policy: &Policy, intent: &Intent, broker: &dyn CredentialBroker) -> Aggregate {
    let mut by_priority: Vec<&crate::policy::Rule> = policy.rules.iter().collect();
    by_priority.sort_by_key(|rule| rule.priority);

    let mut priorities_seen = Vec::new();
    for rule in &by_priority {
        if !priorities_seen.contains(&rule.priority) {
            priorities_seen.push(rule.priority);
        }
    }

    for priority in priorities_seen {
        let matches: Vec<&&crate::policy::Rule> =
            by_priority.iter().filter(|rule| rule.priority == priority && rule.match_predicate.evaluate(intent)).collect();
        if matches.is_empty() {
            continue;
        }

        let mut aggregate = Aggregate {
            verdict: matches[0].effect,
            reason_codes: Vec::new(),
            violations: Vec::new(),
            matched_rule_priority: Some(priority),
        };
        for rule in matches {
            if let Some(failed) = first_failing_precondition(&rule.preconditions, intent, broker) {
                aggregate.verdict = aggregate.verdict.strictest(Verdict::Block);
                aggregate.reason_codes.push(failed.to_owned());
            } else {
                aggregate.verdict = aggregate.verdict.strictest(rule.effect);
                aggregate.reason_codes.extend(rule.reason_codes.iter().cloned());
                aggregate.violations.extend(rule.violations.iter().cloned());
            }
        }
        return aggregate;
    }

    Aggregate {
        verdict: policy.default_verdict,
        reason_codes: vec![DEFAULT_VERDICT_APPLIED.to_owned()],
        violations: Vec::new(),
        matched_rule_priority: None,
    }
}

fn evaluate_script(policy: &Policy, sub_intents: &[Intent], broker: &dyn CredentialBroker) -> Aggregate {
    if sub_intents.len() > policy.scripts.max_steps {
        return Aggregate::blocked(SCRIPT_MAX_STEPS_EXCEEDED, true);
    }

    let mut combined = Aggregate {
        verdict: Verdict::Allow,
        reason_codes: Vec::new(),
        violations: Vec::new(),
        matched_rule_priority: None,
    };

    for sub_intent in sub_intents {
        let mut step = match_rules(policy, sub_intent, broker);
        if let Some(nested) = &sub_intent.script {
            let nested_step = evaluate_script(policy, nested, broker);
            step.verdict = step.verdict.strictest(nested_step.verdict);
            step.reason_codes.extend(nested_step.reason_codes);
            step.violations.extend(nested_step.violations);
        }
        combined.verdict = combined.verdict.strictest(step.verdict);
        combined.reason_codes.extend(step.reason_codes);
        combined.violations.extend(step.violations);
    }

    combined
}

/// Computes the canonical digest of a script intent's ordered tool/argument
/// sequence, the `script_hash` the approved-script registry keys on.
fn script_hash(sub_intents: &[Intent]) -> Result<gait_canon::Digest, PolicyError> {
    let sequence: Result<Vec<(String, gait_canon::Digest)>, PolicyError> = sub_intents
        .iter()
        .map(|sub_intent| Ok((sub_intent.tool_name.clone(), gait_canon::digest(&sub_intent.args)?)))
        .collect();
    Ok(gait_canon::digest(&sequence?)?)
}

/// Evaluates `intent` against `policy`, producing a signed [`GateResult`].
///
/// # Errors
///
/// Returns [`PolicyError`] when the intent, policy, or context cannot be
/// canonicalized/digested, or when signing fails under `prod` signing mode.
pub fn evaluate(
    correlation_id: Option<CorrelationId>,
    intent: &Intent,
    policy: &Policy,
    broker: &dyn CredentialBroker,
    registry: &ApprovedScriptRegistry,
    clock: &dyn Clock,
    config: &GateConfig<'_>,
) -> Result<GateResult, PolicyError> {
    let args_digest = gait_canon::digest(&intent.args)?;
    let intent_digest = gait_canon::digest(intent)?;
    let policy_digest = gait_canon::digest(policy)?;
    let context_set_digest = gait_canon::digest(&intent.context)?;
    let evaluated_at = clock.now();

    let (aggregate, pattern_id, pre_approved, match_origin) = if intent.is_script() {
        let script = intent.script.as_deref().unwrap_or_default();
        let digest = script_hash(script)?;
        match registry.lookup(digest.as_str(), policy_digest.as_str(), evaluated_at) {
            Some(entry) => {
                let signature_ok = config
                    .approved_script_key
                    .map(|key| matches!(gait_signer::verify(key, &entry.script_digest, &entry.signature), Ok(VerifyOutcome::Ok)))
                    .unwrap_or(false);
                if signature_ok {
                    let approved = Aggregate {
                        verdict: entry.verdict,
                        reason_codes: vec![APPROVED_SCRIPT_MATCH.to_owned()],
                        violations: Vec::new(),
                        matched_rule_priority: None,
                    };
                    (approved, Some(entry.pattern_id.clone()), true, MatchOrigin::ApprovedScript)
                } else {
                    (Aggregate::blocked(APPROVED_SCRIPT_SIGNATURE_INVALID, false), None, false, MatchOrigin::ApprovedScript)
                }
            }
            None => {
                let aggregate = evaluate_script(policy, script, broker);
                let origin =
                    if aggregate.matched_rule_priority.is_some() { MatchOrigin::RuleMatch } else { MatchOrigin::Default };
                (aggregate, None, false, origin)
            }
        }
    } else {
        let aggregate = match_rules(policy, intent, broker);
        let origin = if aggregate.matched_rule_priority.is_some() { MatchOrigin::RuleMatch } else { MatchOrigin::Default };
        (aggregate, None, false, origin)
    };

    let reason_codes = gait_schema::normalize_sorted_unique(aggregate.reason_codes);
    let violations = gait_schema::normalize_sorted_unique(aggregate.violations);

    let trace_id_seed = (correlation_id.as_ref().map(ToString::to_string), evaluated_at, args_digest.as_str().to_owned());
    let trace_digest_seed = gait_canon::digest(&trace_id_seed)?;
    let trace_id = TraceId::new(trace_digest_seed.as_str())
        .unwrap_or_else(|_| unreachable!("a digest is always a non-empty string"));

    let mut trace = Trace {
        trace_id,
        correlation_id,
        tool_name: intent.tool_name.clone(),
        args_digest: args_digest.as_str().to_owned(),
        intent_digest: intent_digest.as_str().to_owned(),
        policy_digest: policy_digest.as_str().to_owned(),
        context_set_digest: context_set_digest.as_str().to_owned(),
        verdict: aggregate.verdict,
        reason_codes,
        violations,
        skill_provenance: None,
        delegation_snapshot: None,
        evaluated_at,
        signature: None,
    };

    let trace_digest = gait_canon::digest(&trace)?;
    let signature = gait_signer::sign_for_mode(config.signing_mode, config.private_key, trace_digest.as_str())?;
    trace.signature = signature.clone();

    let signature_status = match (config.signing_mode, &signature) {
        (SigningMode::Dev, None) => SignatureStatus::Unsigned,
        (_, Some(_)) => SignatureStatus::Signed,
        (SigningMode::Prod, None) => SignatureStatus::Invalid,
    };

    Ok(GateResult {
        verdict: aggregate.verdict,
        reason_codes: trace.reason_codes.clone(),
        violations: trace.violations.clone(),
        trace,
        matched_rule_priority: aggregate.matched_rule_priority,
        pattern_id,
        pre_approved,
        match_origin,
        signature_status,
    })
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
    use gait_broker::NoneBroker;
    use gait_core::FixedClock;
    use gait_match::Predicate;
    use gait_signer::SigningMode;

    use super::evaluate;
    use super::GateConfig;
    use crate::intent::Intent;
    use crate::intent::IntentContext;
    use crate::intent::RiskClass;
    use crate::policy::MatchLeaf;
    use crate::policy::Policy;
    use crate::policy::Rule;
    use crate::policy::ScriptLimits;
    use crate::policy::Verdict;
    use crate::trace::ApprovedScriptRegistry;

    fn sample_intent(tool_name: &str) -> Intent {
        Intent {
            tool_name: tool_name.to_owned(),
            args: serde_json::json!({}),
            targets: vec![],
            context: IntentContext {
                identity: "user:alice".to_owned(),
                workspace: "ws-1".to_owned(),
                risk_class: RiskClass::Low,
                session_id: None,
                job_id: None,
                environment_fingerprint: None,
                delegation_chain: None,
                credential_scopes: None,
                data_classes: vec![],
                context_envelope_ref: None,
            },
            script: None,
        }
    }

    fn empty_policy(default_verdict: Verdict) -> Policy {
        Policy { default_verdict, rules: vec![], scripts: ScriptLimits::default() }
    }

    fn dev_config() -> GateConfig<'static> {
        GateConfig { signing_mode: SigningMode::Dev, private_key: None, approved_script_key: None }
    }

    #[test]
    fn default_verdict_applies_when_no_rule_matches() {
        let intent = sample_intent("read_file");
        let policy = empty_policy(Verdict::Allow);
        let broker = NoneBroker;
        let registry = ApprovedScriptRegistry::default();
        let clock = FixedClock;
        let config = dev_config();

        let result = evaluate(None, &intent, &policy, &broker, &registry, &clock, &config).expect("evaluation succeeds");

        assert_eq!(result.verdict, Verdict::Allow);
        assert!(!result.pre_approved);
        assert!(result.reason_codes.contains(&super::DEFAULT_VERDICT_APPLIED.to_owned()));
    }

    #[test]
    fn matching_rule_with_failed_precondition_blocks_with_named_reason() {
        let intent = sample_intent("delete_file");
        let rule = Rule {
            priority: 1,
            effect: Verdict::Allow,
            match_predicate: Predicate::Leaf(MatchLeaf::ToolNameIs("delete_file".to_owned())),
            preconditions: vec![crate::policy::Precondition::RequireDelegation],
            reason_codes: vec![],
            violations: vec![],
        };
        let policy = Policy { default_verdict: Verdict::Allow, rules: vec![rule], scripts: ScriptLimits::default() };
        let broker = NoneBroker;
        let registry = ApprovedScriptRegistry::default();
        let clock = FixedClock;
        let config = dev_config();

        let result = evaluate(None, &intent, &policy, &broker, &registry, &clock, &config).expect("evaluation succeeds");

        assert_eq!(result.verdict, Verdict::Block);
        assert!(result.reason_codes.contains(&super::DELEGATION_MISSING.to_owned()));
    }

    #[test]
    fn lowest_matching_priority_wins_over_higher_priority_rules() {
        let strict = Rule {
            priority: 0,
            effect: Verdict::Block,
            match_predicate: Predicate::Leaf(MatchLeaf::ToolNameIs("read_file".to_owned())),
            preconditions: vec![],
            reason_codes: vec!["blocked_by_strict_rule".to_owned()],
            violations: vec![],
        };
        let lenient = Rule {
            priority: 10,
            effect: Verdict::Allow,
            match_predicate: Predicate::Leaf(MatchLeaf::ToolNameIs("read_file".to_owned())),
            preconditions: vec![],
            reason_codes: vec![],
            violations: vec![],
        };
        let policy =
            Policy { default_verdict: Verdict::Allow, rules: vec![lenient, strict], scripts: ScriptLimits::default() };
        let intent = sample_intent("read_file");
        let broker = NoneBroker;
        let registry = ApprovedScriptRegistry::default();
        let clock = FixedClock;
        let config = dev_config();

        let result = evaluate(None, &intent, &policy, &broker, &registry, &clock, &config).expect("evaluation succeeds");
        assert_eq!(result.verdict, Verdict::Block);
        assert_eq!(result.matched_rule_priority, Some(0));
    }

    #[test]
    fn script_exceeding_step_limit_blocks() {
        let mut intent = sample_intent("run_script");
        intent.script = Some(vec![sample_intent("step"); 3]);
        let policy = Policy { default_verdict: Verdict::Allow, rules: vec![], scripts: ScriptLimits { max_steps: 2 } };
        let broker = NoneBroker;
        let registry = ApprovedScriptRegistry::default();
        let clock = FixedClock;
        let config = dev_config();

        let result = evaluate(None, &intent, &policy, &broker, &registry, &clock, &config).expect("evaluation succeeds");

        assert_eq!(result.verdict, Verdict::Block);
        assert!(result.violations.contains(&super::SCRIPT_MAX_STEPS_EXCEEDED.to_owned()));
    }

    #[test]
    fn evaluation_is_deterministic_for_the_same_inputs() {
        let intent = sample_intent("read_file");
        let policy = empty_policy(Verdict::Allow);
        let broker = NoneBroker;
        let registry = ApprovedScriptRegistry::default();
        let clock = FixedClock;
        let config = dev_config();

        let first = evaluate(None, &intent, &policy, &broker, &registry, &clock, &config).expect("evaluation succeeds");
        let second = evaluate(None, &intent, &policy, &broker, &registry, &clock, &config).expect("evaluation succeeds");

        assert_eq!(first.trace.intent_digest, second.trace.intent_digest);
        assert_eq!(first.trace.trace_id, second.trace.trace_id);
        assert_eq!(first.verdict, second.verdict);
    }
}
