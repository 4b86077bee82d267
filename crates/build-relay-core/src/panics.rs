// crates/build-relay-core/src/panics.rs
// ============================================================================
// Module: Panic Capture
// Description: Catches handler panics together with their location and backtrace.
// Purpose: Give unhandled-panic reports the same diagnostic depth as errors.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`catch`] runs a closure under `catch_unwind` with a process-wide panic
//! hook installed. While a thread is inside [`catch`], the hook records the
//! panic location and a forced backtrace into a thread-local slot instead of
//! printing; panics on other threads go to the previously installed hook.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::cell::RefCell;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

// ============================================================================
// SECTION: State
// ============================================================================

thread_local! {
    /// True while the current thread runs inside [`catch`].
    static GUARDED: Cell<bool> = const { Cell::new(false) };
    /// Trace recorded by the hook for the most recent guarded panic.
    static CAPTURED: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Installs the hook once per process.
static INSTALL: Once = Once::new();

// ============================================================================
// SECTION: Capture
// ============================================================================

/// A panic caught by [`catch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaughtPanic {
    /// Panic payload text.
    pub message: String,
    /// `panicked at <location>` followed by the backtrace.
    pub trace: String,
}

impl CaughtPanic {
    /// Renders the message and trace.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        if self.trace.is_empty() {
            self.message.clone()
        } else {
            format!("{}\n{}", self.message, self.trace)
        }
    }
}

/// Runs `f`, converting a panic into a [`CaughtPanic`].
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, CaughtPanic> {
    install_hook();
    let was_guarded = GUARDED.with(|guarded| guarded.replace(true));
    CAPTURED.with(|slot| slot.borrow_mut().take());
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    GUARDED.with(|guarded| guarded.set(was_guarded));
    result.map_err(|payload| CaughtPanic {
        message: panic_message(payload.as_ref()),
        trace: CAPTURED.with(|slot| slot.borrow_mut().take()).unwrap_or_default(),
    })
}

/// Chains a recording hook in front of the existing one.
fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !GUARDED.with(Cell::get) {
                previous(info);
                return;
            }
            let location = info
                .location()
                .map_or_else(|| "unknown location".to_string(), ToString::to_string);
            let trace = format!("panicked at {location}\n{}", Backtrace::force_capture());
            CAPTURED.with(|slot| *slot.borrow_mut() = Some(trace));
        }));
    });
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
