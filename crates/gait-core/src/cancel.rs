// crates/gait-core/src/cancel.rs
// ============================================================================
// Module: Cancellation
// Description: A plain, cloneable cancellation signal for synchronous
//              operations.
// Purpose: Let callers abort a blocking archive write/verify or regress run
//          at a suspension point without leaving a partial artifact behind.
// Dependencies: std::sync::atomic
// ============================================================================

//! ## Overview
//! The core is synchronous throughout (per the concurrency design), so
//! cancellation is not an async primitive: it is a shared flag checked at
//! suspension points (before a write, before a rename, between grader
//! passes). Checking during pure CPU work (canonicalization, digesting,
//! predicate evaluation) is never required and never happens.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Returned when an operation observes a cancellation request at a
/// suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

impl crate::error::Categorized for Cancelled {
    fn category(&self) -> crate::ErrorCategory {
        // Cancellation always interrupts a suspension point (filesystem I/O
        // or a broker subprocess call), never pure CPU work, so it is
        // reported alongside the other interrupted-I/O categories.
        crate::ErrorCategory::IoFailure
    }
}

/// A shared, cloneable cancellation signal.
///
/// # Invariants
/// - Once cancelled, a token never un-cancels; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Builds a fresh, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Checks the token at a suspension point.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] when cancellation has been requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() { Err(Cancelled) } else { Ok(()) }
    }
}
