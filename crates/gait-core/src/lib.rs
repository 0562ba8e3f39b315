// crates/gait-core/src/lib.rs
// ============================================================================
// Module: Gait Core
// Description: Shared identifiers, clock abstraction, and error taxonomy.
// Purpose: Provide the primitives every other gait crate builds on.
// ============================================================================

//! ## Overview
//! `gait-core` has no business logic of its own. It exists so that identifier
//! types, timestamps, and the closed error taxonomy are defined exactly once
//! and shared by every other crate in the workspace.

/// Cooperative cancellation token and its error type.
pub mod cancel;
/// The closed error-category taxonomy and its exit-code mapping.
pub mod error;
/// Newtype identifier types shared across the control plane's records.
pub mod ids;
/// UTC timestamps and the clock abstraction that produces them.
pub mod time;

pub use cancel::CancellationToken;
pub use cancel::Cancelled;
pub use error::ErrorCategory;
pub use ids::CorrelationId;
pub use ids::FamilyId;
pub use ids::RefId;
pub use ids::RunId;
pub use ids::SchemaId;
pub use ids::TraceId;
pub use time::Clock;
pub use time::FixedClock;
pub use time::SystemClock;
pub use time::Timestamp;
