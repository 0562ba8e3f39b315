// crates/gait-policy/src/lib.rs
// ============================================================================
// Module: Gait Policy
// Description: Deterministic PolicyGate evaluation over intents.
// Purpose: Decide, with a signed and reproducible trace, whether a proposed
//          tool call should be allowed, dry-run, require approval, or be
//          blocked.
// Dependencies: gait-broker, gait-canon, gait-core, gait-match, gait-schema,
//               gait-signer
// ============================================================================

//! ## Overview
//! This crate has three parts: the [`intent`] an evaluation runs against, the
//! [`policy`] document that decides it, and the [`trace`] record an
//! evaluation emits. [`evaluate::evaluate`] ties them together.

/// Categorized errors for policy parsing and gate evaluation.
pub mod error;
/// The PolicyGate evaluation algorithm.
pub mod evaluate;
/// The proposed tool call submitted for policy evaluation.
pub mod intent;
/// The declarative policy document and its verdict aggregation.
pub mod policy;
/// The signed record a gate evaluation emits.
pub mod trace;

pub use error::PolicyError;
pub use evaluate::evaluate;
pub use evaluate::GateConfig;
pub use intent::Intent;
pub use intent::IntentContext;
pub use intent::RiskClass;
pub use intent::TargetRef;
pub use policy::parse_policy_document;
pub use policy::MatchLeaf;
pub use policy::Policy;
pub use policy::Precondition;
pub use policy::Rule;
pub use policy::Verdict;
pub use trace::ApprovedScriptRegistry;
pub use trace::GateResult;
pub use trace::Trace;
