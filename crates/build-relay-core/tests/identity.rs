// crates/build-relay-core/tests/identity.rs
// ============================================================================
// Module: Identity Allocator Tests
// Description: Concurrency tests for invocation id allocation.
// Purpose: Validate uniqueness and ordering under contention.
// Dependencies: build-relay-core
// ============================================================================

//! ## Overview
//! Exercises [`build_relay_core::IdentityAllocator`] from many threads and
//! through concurrently dispatched invocations.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
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

mod common;

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::thread;

use build_relay_core::CommandRouter;
use build_relay_core::IdentityAllocator;
use build_relay_core::InvocationContext;
use build_relay_core::InvocationError;
use build_relay_core::Origin;

use crate::common::harness;

// ============================================================================
// SECTION: Allocator
// ============================================================================

#[test]
fn concurrent_allocations_are_unique_and_dense() {
    let allocator = IdentityAllocator::new();
    let threads = 8;
    let per_thread = 250;
    let all = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| (0..per_thread).map(|_| allocator.next_id().get()).collect::<Vec<_>>())
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
    });

    for ids in &all {
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "per-thread ids must increase");
    }
    let unique: BTreeSet<u64> = all.iter().flatten().copied().collect();
    assert_eq!(unique.len(), threads * per_thread);
    assert_eq!(unique.first().copied(), Some(1));
    assert_eq!(unique.last().copied(), Some((threads * per_thread) as u64));
}

#[test]
fn issuance_order_matches_value_order() {
    let allocator = IdentityAllocator::new();
    let issued = Mutex::new(Vec::new());
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    // Record under the same lock so the log reflects issuance order.
                    let mut log = issued.lock().unwrap();
                    log.push(allocator.next_id());
                }
            });
        }
    });
    let issued = issued.into_inner().unwrap();
    assert!(issued.windows(2).all(|pair| pair[0] < pair[1]));
}

// ============================================================================
// SECTION: Router Integration
// ============================================================================

#[test]
fn concurrent_dispatches_receive_distinct_ids() {
    let harness = harness();
    let router = CommandRouter::builder(harness.services.clone())
        .register(
            "noop",
            "does nothing",
            0,
            |_ctx: &mut InvocationContext, _args: &[String]| -> Result<(), InvocationError> {
                Ok(())
            },
        )
        .build();

    let ids = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                scope.spawn(|| router.dispatch("noop webapp", Origin::detached()).unwrap().id)
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect::<BTreeSet<_>>()
    });
    assert_eq!(ids.len(), 16);
}
