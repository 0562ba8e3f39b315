// crates/gait-schema/src/lib.rs
// ============================================================================
// Module: Gait Schema
// Description: Typed record envelopes, version acceptance, and validation.
// Purpose: Give every persisted record a declared schema identity and let
//          readers tolerate additive fields they do not recognize.
// Dependencies: gait-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every record in the control plane carries `schema_id`, `schema_version`,
//! `created_at`, and `producer_version` (the [`RecordHeader`]), plus whatever
//! fields its typed projection declares. Fields the current reader does not
//! recognize are preserved in a residual map rather than dropped, so a record
//! written by a newer producer still round-trips through an older reader.

use std::collections::BTreeSet;

use gait_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

/// The common header every schema record carries.
///
/// # Invariants
/// - `schema_version` is one of the versions the declaring type accepts.
/// - `created_at` is UTC (enforced by [`gait_core::Timestamp`]'s own parsing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    /// Stable identifier for this record's schema.
    pub schema_id: String,
    /// Semantic version string for this record's shape.
    pub schema_version: String,
    /// When the record was produced.
    pub created_at: Timestamp,
    /// Version of the component that produced the record.
    pub producer_version: String,
}

/// A non-empty set of schema versions a reader accepts for a given `schema_id`.
///
/// The spec requires accept/reject against a declared alphabet, not semver
/// range arithmetic, so this is an exact-match set rather than a semver
/// range parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSet(BTreeSet<String>);

impl VersionSet {
    /// Builds a version set from an iterator of accepted version strings.
    ///
    /// # Panics
    ///
    /// Panics if `versions` yields no items; a reader that accepts nothing is
    /// a configuration error, not a runtime outcome, so this is asserted at
    /// construction rather than surfaced as a `Result`.
    #[must_use]
    pub fn new(versions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let set: BTreeSet<String> = versions.into_iter().map(Into::into).collect();
        assert!(!set.is_empty(), "a VersionSet must accept at least one version");
        Self(set)
    }

    /// Returns whether `version` is accepted by this set.
    #[must_use]
    pub fn accepts(&self, version: &str) -> bool {
        self.0.contains(version)
    }
}

/// The class of schema validation failure, used for exit-code and operational
/// classification purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// A required field was missing.
    RequiredMissing,
    /// A field's value failed validation (wrong type, malformed string, etc).
    ValueInvalid,
    /// A field's value was outside its declared range.
    ValueOutOfRange,
    /// The record's `schema_id` is not one this reader recognizes.
    SchemaUnsupported,
    /// The record's `schema_version` is not accepted for its `schema_id`.
    SchemaVersionUnsupported,
}

/// A structured schema validation error, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema validation failed at {field_path}: {failure_class:?}")]
pub struct ValidationError {
    /// Dot-separated path to the offending field.
    pub field_path: String,
    /// The class of failure.
    pub failure_class: FailureClass,
}

impl gait_core::error::Categorized for ValidationError {
    fn category(&self) -> gait_core::ErrorCategory {
        gait_core::ErrorCategory::InvalidInput
    }
}

impl ValidationError {
    /// Builds a validation error for a missing required field.
    #[must_use]
    pub fn required_missing(field_path: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), failure_class: FailureClass::RequiredMissing }
    }

    /// Builds a validation error for an invalid field value.
    #[must_use]
    pub fn value_invalid(field_path: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), failure_class: FailureClass::ValueInvalid }
    }

    /// Builds a validation error for an out-of-range field value.
    #[must_use]
    pub fn value_out_of_range(field_path: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), failure_class: FailureClass::ValueOutOfRange }
    }

    /// Builds a validation error for an unrecognized schema id.
    #[must_use]
    pub fn schema_unsupported(field_path: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), failure_class: FailureClass::SchemaUnsupported }
    }

    /// Builds a validation error for an unaccepted schema version.
    #[must_use]
    pub fn schema_version_unsupported(field_path: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), failure_class: FailureClass::SchemaVersionUnsupported }
    }
}

/// Validates a record header against a declared schema id and accepted
/// version set.
///
/// # Errors
///
/// Returns [`ValidationError`] with [`FailureClass::SchemaUnsupported`] when
/// `header.schema_id` does not match `expected_schema_id`, or
/// [`FailureClass::SchemaVersionUnsupported`] when `header.schema_version` is
/// not in `accepted`.
pub fn validate_header(
    header: &RecordHeader,
    expected_schema_id: &str,
    accepted: &VersionSet,
) -> Result<(), ValidationError> {
    if header.schema_id != expected_schema_id {
        return Err(ValidationError::schema_unsupported("schema_id"));
    }
    if !accepted.accepts(&header.schema_version) {
        return Err(ValidationError::schema_version_unsupported("schema_version"));
    }
    Ok(())
}

/// Sorts a collection of strings and removes duplicates after trimming, per
/// the sorted-unique-collection invariant that applies to every such field
/// in a persisted record (`reason_codes`, `violations`, `target_systems`, ...).
#[must_use]
pub fn normalize_sorted_unique(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let set: BTreeSet<String> = values.into_iter().map(|value| value.trim().to_owned()).collect();
    set.into_iter().collect()
}

/// A typed record paired with the residual fields its projection does not
/// recognize, preserved so consumer-visible re-serialization round-trips
/// additive fields a newer producer wrote.
///
/// This is the schema-evolution mechanism named in the design notes: unknown
/// fields are captured as an opaque map alongside the typed projection rather
/// than probed for at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithResidual<T> {
    /// The typed projection of the record.
    #[serde(flatten)]
    pub typed: T,
    /// Fields present in the source document but not declared by `T`.
    #[serde(flatten)]
    pub residual: serde_json::Map<String, serde_json::Value>,
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
    use serde_json::json;

    use super::normalize_sorted_unique;
    use super::validate_header;
    use super::FailureClass;
    use super::RecordHeader;
    use super::VersionSet;
    use super::WithResidual;
    use gait_core::Timestamp;

    fn sample_header() -> RecordHeader {
        RecordHeader {
            schema_id: "gait.trace".to_owned(),
            schema_version: "1.0.0".to_owned(),
            created_at: Timestamp::fixed_epoch(),
            producer_version: "0.1.0".to_owned(),
        }
    }

    #[test]
    fn accepts_a_known_version() {
        let header = sample_header();
        let accepted = VersionSet::new(["1.0.0", "1.1.0"]);
        assert!(validate_header(&header, "gait.trace", &accepted).is_ok());
    }

    #[test]
    fn rejects_unknown_schema_id() {
        let header = sample_header();
        let accepted = VersionSet::new(["1.0.0"]);
        let err = validate_header(&header, "gait.manifest", &accepted).expect_err("schema id mismatches");
        assert_eq!(err.failure_class, FailureClass::SchemaUnsupported);
    }

    #[test]
    fn rejects_unaccepted_version() {
        let header = sample_header();
        let accepted = VersionSet::new(["2.0.0"]);
        let err = validate_header(&header, "gait.trace", &accepted).expect_err("version not accepted");
        assert_eq!(err.failure_class, FailureClass::SchemaVersionUnsupported);
    }

    #[test]
    fn normalizes_sorted_unique_collections() {
        let values = vec![" b ".to_owned(), "a".to_owned(), "a".to_owned(), "b".to_owned()];
        assert_eq!(normalize_sorted_unique(values), vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn residual_fields_round_trip() {
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct Known {
            name: String,
        }

        let source = json!({"name": "tool.echo", "future_field": "kept"});
        let parsed: WithResidual<Known> =
            serde_json::from_value(source.clone()).expect("known field plus residual parses");
        assert_eq!(parsed.typed.name, "tool.echo");
        assert_eq!(parsed.residual.get("future_field"), Some(&json!("kept")));

        let re_serialized = serde_json::to_value(&parsed).expect("round trip re-serializes");
        assert_eq!(re_serialized, source);
    }
}
