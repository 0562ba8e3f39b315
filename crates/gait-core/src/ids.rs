// crates/gait-core/src/ids.rs
// ============================================================================
// Module: Identifiers
// Description: Newtype string identifiers used throughout the control plane.
// Purpose: Prevent accidental mixing of unrelated identifier strings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every identifier named in the data model is its own type. None of them are
//! interchangeable with a bare `String`, and construction rejects empty input.

use std::fmt;

/// Error returned when constructing an identifier from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

macro_rules! opaque_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Constructs a new identifier, rejecting empty strings.
            ///
            /// # Errors
            ///
            /// Returns [`EmptyIdentifier`] when `value` is empty.
            pub fn new(value: impl Into<String>) -> Result<Self, EmptyIdentifier> {
                let value = value.into();
                if value.is_empty() {
                    return Err(EmptyIdentifier);
                }
                Ok(Self(value))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

opaque_id!(TraceId, "Identifier for a single signed gate trace.");
opaque_id!(CorrelationId, "Caller-supplied identifier correlating related intents.");
opaque_id!(RunId, "Identifier for a single run, stable across its runpack.");
opaque_id!(RefId, "Identifier for an external content reference receipt.");
opaque_id!(FamilyId, "Identifier for a Scout Signal family, derived from its members.");
opaque_id!(SchemaId, "Stable identifier for a record's schema.");

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
    use super::RunId;

    #[test]
    fn rejects_empty() {
        assert!(RunId::new("").is_err());
    }

    #[test]
    fn round_trips_through_serde() {
        let id = RunId::new("run_demo").expect("non-empty literal");
        let json = serde_json::to_string(&id).expect("identifiers serialize to plain strings");
        assert_eq!(json, "\"run_demo\"");
        let back: RunId = serde_json::from_str(&json).expect("plain strings deserialize back");
        assert_eq!(back, id);
    }

    #[test]
    fn displays_as_raw_value() {
        let id = RunId::new("run_demo").expect("non-empty literal");
        assert_eq!(id.to_string(), "run_demo");
        assert_eq!(id.as_str(), "run_demo");
    }
}
