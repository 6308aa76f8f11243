//! Testing utilities.
//!
//! Helpers for observing what a computation did when it ran, a ready-made
//! cancelled context, and assertion macros for [`Result`](crate::Result)s.
//!
//! # Examples
//!
//! ```rust
//! use undertow::effect::from_io;
//! use undertow::testing::{cancelled_context, CallCounter};
//! use undertow::{assert_cancelled, assert_ok, Context, IO};
//!
//! # tokio_test::block_on(async {
//! let calls = CallCounter::new();
//! let counted = {
//!     let calls = calls.clone();
//!     from_io::<(), _>(IO::from_fn(move || calls.hit()))
//! };
//!
//! assert_ok!(counted.run((), Context::background()).await);
//! assert_cancelled!(counted.run((), cancelled_context()).await);
//! assert_eq!(calls.count(), 1);
//! # });
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::context::Context;

/// Counts how many times something ran.
///
/// Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
}

impl CallCounter {
    /// A counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call and return how many calls there were before it.
    pub fn hit(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst)
    }

    /// The number of recorded calls.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Records values in the order they were pushed.
///
/// Clones share the same log.
#[derive(Debug)]
pub struct Recorder<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Recorder {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Recorder {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> Recorder<T> {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value.
    pub fn push(&self, value: T) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(value);
    }

    /// A copy of everything recorded so far.
    pub fn entries(&self) -> Vec<T> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// A context that is already cancelled.
pub fn cancelled_context() -> Context {
    let (ctx, cancel) = Context::background().with_cancel();
    cancel.cancel();
    ctx
}

/// Assert that a result is `Ok`, evaluating to the success value.
///
/// # Example
///
/// ```rust
/// use undertow::{assert_ok, Result};
///
/// let result: Result<i32> = Ok(42);
/// assert_eq!(assert_ok!(result), 42);
/// ```
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {}", e),
        }
    };
}

/// Assert that a result is `Err`, evaluating to the error.
///
/// # Example
///
/// ```rust
/// use undertow::{assert_err, Error, Result};
///
/// let result: Result<i32> = Err(Error::msg("boom"));
/// assert_eq!(assert_err!(result).root_message(), "boom");
/// ```
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Err(e) => e,
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
        }
    };
}

/// Assert that a result failed because its context was cancelled or its
/// deadline passed.
///
/// # Example
///
/// ```rust
/// use undertow::{assert_cancelled, Error, Result};
///
/// let result: Result<()> = Err(Error::cancelled());
/// assert_cancelled!(result);
/// ```
#[macro_export]
macro_rules! assert_cancelled {
    ($result:expr) => {
        match $result {
            Err(e) if e.is_cancellation() => {}
            Err(e) => panic!("Expected a cancellation error, got: {}", e),
            Ok(v) => panic!("Expected a cancellation error, got Ok: {:?}", v),
        }
    };
}
