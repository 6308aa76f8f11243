//! Deferred computations that may fail.
//!
//! [`IOResult<A>`] is an [`IO`] whose value is a [`Result<A>`]. Its
//! combinators short-circuit on the first error, the same way `?` does in an
//! `async fn`.
//!
//! ```
//! use undertow::{Error, IOResult};
//!
//! # tokio_test::block_on(async {
//! let parsed = IOResult::from_fn(|| "42".parse::<i32>().map_err(Error::new))
//!     .map(|n| n * 2);
//! assert_eq!(parsed.run().await, Ok(84));
//!
//! let failed = IOResult::<i32>::left(Error::msg("boom")).map(|n| n * 2);
//! assert_eq!(failed.run().await, Err(Error::msg("boom")));
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use crate::error::{Error, Result};
use crate::io::IO;

/// A deferred computation producing `Ok(A)` or an [`Error`].
pub struct IOResult<A> {
    io: IO<Result<A>>,
}

impl<A> Clone for IOResult<A> {
    fn clone(&self) -> Self {
        IOResult {
            io: self.io.clone(),
        }
    }
}

impl<A> fmt::Debug for IOResult<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IOResult")
            .field("thunk", &"<function>")
            .finish()
    }
}

impl<A> IOResult<A>
where
    A: Send + 'static,
{
    /// Create an `IOResult` from an async thunk.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<A>> + Send + 'static,
    {
        IOResult { io: IO::new(f) }
    }

    /// Create an `IOResult` from a synchronous thunk.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<A> + Send + Sync + 'static,
    {
        IOResult {
            io: IO::from_fn(f),
        }
    }

    /// A successful computation yielding a clone of `value`.
    pub fn of(value: A) -> Self
    where
        A: Clone + Sync,
    {
        IOResult::new(move || future::ok(value.clone()))
    }

    /// Alias of [`IOResult::of`].
    pub fn right(value: A) -> Self
    where
        A: Clone + Sync,
    {
        IOResult::of(value)
    }

    /// A failed computation.
    pub fn left(error: Error) -> Self {
        IOResult::new(move || future::err(error.clone()))
    }

    /// Lift an already computed result.
    pub fn from_result(result: Result<A>) -> Self
    where
        A: Clone + Sync,
    {
        IOResult::new(move || future::ready(result.clone()))
    }

    /// Lift an infallible `IO`.
    pub fn from_io(io: IO<A>) -> Self {
        IOResult { io: io.map(Ok) }
    }

    /// Start the computation.
    pub fn run(&self) -> BoxFuture<'static, Result<A>> {
        self.io.run()
    }

    /// View this computation as an `IO` of its result.
    pub fn into_io(self) -> IO<Result<A>> {
        self.io
    }

    /// Transform the success value.
    pub fn map<B, F>(self, f: F) -> IOResult<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        IOResult {
            io: self.io.map(move |result| result.map(&f)),
        }
    }

    /// Transform the error value.
    pub fn map_left<F>(self, f: F) -> IOResult<A>
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        IOResult {
            io: self.io.map(move |result| result.map_err(&f)),
        }
    }

    /// Sequence a dependent computation after a success.
    pub fn chain<B, F>(self, f: F) -> IOResult<B>
    where
        B: Send + 'static,
        F: Fn(A) -> IOResult<B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        IOResult::new(move || {
            let fut = self.run();
            let f = f.clone();
            async move {
                let value = fut.await?;
                f(value).run().await
            }
        })
    }

    /// Recover from an error with a new computation.
    ///
    /// Cancellation errors are not recovered.
    pub fn chain_left<F>(self, f: F) -> IOResult<A>
    where
        F: Fn(Error) -> IOResult<A> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        IOResult::new(move || {
            let fut = self.run();
            let f = f.clone();
            async move {
                match fut.await {
                    Ok(value) => Ok(value),
                    Err(error) if error.is_cancellation() => Err(error),
                    Err(error) => f(error).run().await,
                }
            }
        })
    }

    /// Fall back to `second` only if this computation fails.
    pub fn alt<F>(self, second: F) -> IOResult<A>
    where
        F: Fn() -> IOResult<A> + Send + Sync + 'static,
    {
        self.chain_left(move |_| second())
    }
}
