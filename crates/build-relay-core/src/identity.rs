// crates/build-relay-core/src/identity.rs
// ============================================================================
// Module: Invocation Identity
// Description: Invocation identifiers and the shared identity allocator.
// Purpose: Hand out unique, strictly increasing ids across concurrent invocations.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Every command or event invocation is tagged with an [`InvocationId`] drawn
//! from a single [`IdentityAllocator`]. The allocator is the only state shared
//! between concurrently running invocations and is guarded by a mutex so ids
//! are totally ordered in issuance order.
//! Invariants:
//! - Ids are 1-based and never reused within a process.
//! - Each id is strictly greater than every id issued before it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;

// ============================================================================
// SECTION: Identifier Type
// ============================================================================

/// Identifier for a single invocation.
///
/// # Invariants
/// - Always >= 1 when issued by an [`IdentityAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(u64);

impl InvocationId {
    /// Creates an identifier from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Allocator
// ============================================================================

/// Process-wide monotonic id allocator.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    /// Last issued value; zero before the first allocation.
    last: Mutex<u64>,
}

impl IdentityAllocator {
    /// Creates an allocator whose first id is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: Mutex::new(0),
        }
    }

    /// Issues the next invocation id.
    pub fn next_id(&self) -> InvocationId {
        // A poisoned counter still holds a valid value; keep issuing from it.
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        *last = last.saturating_add(1);
        InvocationId(*last)
    }
}
