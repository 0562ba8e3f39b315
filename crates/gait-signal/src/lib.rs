// crates/gait-signal/src/lib.rs
// ============================================================================
// Module: Gait Signal
// Description: Deterministic clustering and ranking of run incidents.
// Purpose: Turn a set of runpacks into a short, ranked list of the failure
//          families most worth an operator's attention.
// Dependencies: gait-canon, gait-core, gait-runpack, gait-schema
// ============================================================================

//! ## Overview
//! [`observation::extract_observation`] reduces one runpack (plus optional
//! trace contributions and regress reason codes) to a fixed set of
//! clustering fields. [`fingerprint::run_fingerprint`] turns that into a
//! stable identity, [`family::group_into_families`] clusters observations
//! sharing a fingerprint and scores each cluster's severity, and
//! [`report::build_report`] ranks and caps the result into a
//! [`report::SignalReport`]. The whole pipeline is a pure function of its
//! inputs: the same runpacks and traces, in any order, yield the same report.

/// Categorized errors for observation extraction and report assembly.
pub mod error;
/// Grouping observations sharing a run fingerprint into severity-scored families.
pub mod family;
/// The deterministic digest identifying a run's clustering fingerprint.
pub mod fingerprint;
/// Reducing a runpack (plus optional trace/regress contributions) to clustering fields.
pub mod observation;
/// Ranking families into a capped, deterministically-ordered signal report.
pub mod report;
/// Family severity scoring from privilege, sensitivity, posture, and reason cardinality.
pub mod severity;

pub use error::SignalError;
pub use family::group_into_families;
pub use family::Family;
pub use fingerprint::run_fingerprint;
pub use observation::extract_observation;
pub use observation::RunObservation;
pub use observation::TraceContribution;
pub use report::build_report;
pub use report::SignalIssue;
pub use report::SignalReport;
pub use severity::SeverityInputs;
pub use severity::SeverityLevel;
