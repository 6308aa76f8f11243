//! Environment-dependent deferred computations that may fail.
//!
//! [`ReaderIOResult<R, A>`] is the narrower type that a
//! [`ReaderReaderIOResult`](crate::ReaderReaderIOResult) becomes once its
//! outer environment has been supplied with
//! [`read`](crate::ReaderReaderIOResult::read). In that role the environment
//! is the cancellation [`Context`](crate::Context).
//!
//! ```
//! use undertow::{Error, ReaderIOResult};
//!
//! # tokio_test::block_on(async {
//! let port = ReaderIOResult::asks(|raw: String| raw.parse::<u16>().map_err(Error::new));
//!
//! assert_eq!(port.execute("8080".to_string()).await, Ok(8080));
//! assert!(port.execute("http".to_string()).await.is_err());
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::io_result::IOResult;

/// A function from an environment to a fallible deferred computation.
pub struct ReaderIOResult<R, A> {
    f: Arc<dyn Fn(R) -> IOResult<A> + Send + Sync>,
}

impl<R, A> Clone for ReaderIOResult<R, A> {
    fn clone(&self) -> Self {
        ReaderIOResult { f: self.f.clone() }
    }
}

impl<R, A> fmt::Debug for ReaderIOResult<R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderIOResult")
            .field("f", &"<function>")
            .finish()
    }
}

impl<R, A> ReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a `ReaderIOResult` from a function producing an `IOResult`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(R) -> IOResult<A> + Send + Sync + 'static,
    {
        ReaderIOResult { f: Arc::new(f) }
    }

    /// Succeed with a clone of `value`.
    pub fn of(value: A) -> Self
    where
        A: Clone + Sync,
    {
        ReaderIOResult::from_io_result(IOResult::of(value))
    }

    /// Fail with `error`.
    pub fn left(error: Error) -> Self {
        ReaderIOResult::from_io_result(IOResult::left(error))
    }

    /// Lift a computation that does not need the environment.
    pub fn from_io_result(io: IOResult<A>) -> Self {
        ReaderIOResult::new(move |_| io.clone())
    }

    /// Lift an already computed result.
    pub fn from_result(result: Result<A>) -> Self
    where
        A: Clone + Sync,
    {
        ReaderIOResult::from_io_result(IOResult::from_result(result))
    }

    /// Compute a result from the environment when run.
    pub fn asks<F>(f: F) -> Self
    where
        F: Fn(R) -> Result<A> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderIOResult::new(move |env: R| {
            let f = f.clone();
            IOResult::from_fn(move || f(env.clone()))
        })
    }

    /// Supply the environment.
    pub fn run(&self, env: R) -> IOResult<A> {
        (self.f)(env)
    }

    /// Supply the environment and start the computation.
    pub fn execute(&self, env: R) -> BoxFuture<'static, Result<A>> {
        self.run(env).run()
    }

    /// Transform the success value.
    pub fn map<B, F>(self, f: F) -> ReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderIOResult::new(move |env| {
            let f = f.clone();
            self.run(env).map(move |a| f(a))
        })
    }

    /// Transform the error value.
    pub fn map_left<F>(self, f: F) -> ReaderIOResult<R, A>
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderIOResult::new(move |env| {
            let f = f.clone();
            self.run(env).map_left(move |e| f(e))
        })
    }

    /// Sequence a dependent computation after a success, sharing the environment.
    pub fn chain<B, F>(self, f: F) -> ReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> ReaderIOResult<R, B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderIOResult::new(move |env: R| {
            let f = f.clone();
            let next_env = env.clone();
            self.run(env).chain(move |a| f(a).run(next_env.clone()))
        })
    }

    /// Recover from an error with a new computation, sharing the environment.
    pub fn chain_left<F>(self, f: F) -> ReaderIOResult<R, A>
    where
        F: Fn(Error) -> ReaderIOResult<R, A> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderIOResult::new(move |env: R| {
            let f = f.clone();
            let next_env = env.clone();
            self.run(env).chain_left(move |e| f(e).run(next_env.clone()))
        })
    }

    /// Run against an environment derived from another one.
    pub fn local<R2, F>(self, f: F) -> ReaderIOResult<R2, A>
    where
        R2: Clone + Send + Sync + 'static,
        F: Fn(R2) -> R + Send + Sync + 'static,
    {
        ReaderIOResult::new(move |env| self.run(f(env)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_of_and_left() {
        assert_eq!(ReaderIOResult::<(), _>::of(1).execute(()).await, Ok(1));
        assert_eq!(
            ReaderIOResult::<(), i32>::left(Error::msg("e")).execute(()).await,
            Err(Error::msg("e"))
        );
    }

    #[tokio::test]
    async fn test_chain_shares_environment() {
        let rior = ReaderIOResult::asks(|n: i32| Ok(n + 1))
            .chain(|m| ReaderIOResult::asks(move |n: i32| Ok(m * n)));
        assert_eq!(rior.execute(6).await, Ok(42));
    }

    #[tokio::test]
    async fn test_chain_left_and_map_left() {
        let rior = ReaderIOResult::<(), i32>::left(Error::msg("e"))
            .map_left(|e| e.context("wrapped"))
            .chain_left(|e| ReaderIOResult::of(e.context_trail().len() as i32));
        assert_eq!(rior.execute(()).await, Ok(1));
    }

    #[tokio::test]
    async fn test_local_reshapes_environment() {
        let rior = ReaderIOResult::asks(|n: usize| Ok(n * 2)).local(|s: String| s.len());
        assert_eq!(rior.execute("four".to_string()).await, Ok(8));
    }
}
