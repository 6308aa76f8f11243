//! The layered effect type.
//!
//! [`ReaderReaderIOResult<R, A>`] describes a computation that
//!
//! 1. reads an outer, rarely-changing environment `R` (configuration,
//!    connection pools, clients),
//! 2. reads an inner, per-call cancellation [`Context`],
//! 3. defers all side effects until it is explicitly run,
//! 4. yields either `Ok(A)` or an [`Error`](crate::Error).
//!
//! Building and composing values runs nothing. Execution happens at the
//! boundary, by supplying the environment, then the context, then starting
//! the deferred computation:
//!
//! ```
//! use undertow::prelude::*;
//!
//! #[derive(Clone)]
//! struct Env { greeting: &'static str }
//!
//! # tokio_test::block_on(async {
//! let hello = asks(|env: Env| env.greeting)
//!     .map(|greeting| format!("{}, world", greeting));
//!
//! let ctx = Context::background();
//!
//! // The three-step application: environment, context, thunk.
//! let result = hello.read(Env { greeting: "hello" }).run(ctx.clone()).run().await;
//! assert_eq!(result, Ok("hello, world".to_string()));
//!
//! // The same thing in one call.
//! assert_eq!(hello.run(Env { greeting: "hi" }, ctx).await, Ok("hi, world".to_string()));
//! # });
//! ```
//!
//! # Environment Cloning
//!
//! The environment is handed by value to every step of a composed
//! computation, so `R` must be `Clone`. Keep environments cheap to clone by
//! holding shared resources behind `Arc`:
//!
//! ```rust,ignore
//! #[derive(Clone)]
//! struct AppEnv {
//!     db: Arc<DatabasePool>,
//!     config: Arc<Config>,
//! }
//! ```
//!
//! # Cancellation
//!
//! The context is forwarded unchanged through every combinator. Effectful
//! leaves ([`from_io`], [`from_async`], ...) refuse to start once the context
//! is done and abandon their future when it becomes done while they wait.
//! [`chain`](ReaderReaderIOResult::chain) and the sequential combinators check
//! the context between steps, so a pre-cancelled context surfaces a
//! cancellation error instead of running later steps.

mod array;
mod bind;
mod bracket;
mod cancel;
mod combinators;
mod constructors;
mod flip;
mod local;
mod retry;
mod tracing;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::context::Context;
use crate::error::Result;
use crate::io_result::IOResult;
use crate::reader_io_result::ReaderIOResult;

pub use array::{
    sequence_array, sequence_array_par, traverse_array, traverse_array_par,
    traverse_array_with_index,
};
pub use bind::do_;
pub use bracket::{bracket, bracket_with, with_resource, ReleasePolicy, Resource};
pub use constructors::{
    ask, asks, from_async, from_context_reader, from_io, from_io_result, from_option,
    from_predicate, from_reader, from_reader_io, from_reader_io_result, from_reader_result,
    from_result, left, of, right,
};
pub use flip::{
    sequence, sequence_reader, sequence_reader_io, sequence_reader_io_result, traverse,
    traverse_reader,
};
pub use retry::retrying;

type RunFn<R, A> = dyn Fn(R, Context) -> BoxFuture<'static, Result<A>> + Send + Sync;

/// A computation reading an environment `R` and a cancellation [`Context`],
/// deferring its effects, and producing a [`Result<A>`](crate::Result).
///
/// Values are immutable and cheap to clone; composing them builds new values
/// and the same value may be run any number of times.
pub struct ReaderReaderIOResult<R, A> {
    run_fn: Arc<RunFn<R, A>>,
}

impl<R, A> Clone for ReaderReaderIOResult<R, A> {
    fn clone(&self) -> Self {
        ReaderReaderIOResult {
            run_fn: self.run_fn.clone(),
        }
    }
}

impl<R, A> fmt::Debug for ReaderReaderIOResult<R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderReaderIOResult")
            .field("run_fn", &"<function>")
            .finish()
    }
}

impl<R, A> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a computation from a function of the environment and context.
    ///
    /// This is the raw constructor: the function is trusted to honor the
    /// context itself. Prefer [`from_async`] for leaves that should stop when
    /// the context is done.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(R, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<A>> + Send + 'static,
    {
        ReaderReaderIOResult {
            run_fn: Arc::new(move |env, ctx| f(env, ctx).boxed()),
        }
    }

    /// Supply the environment and the context, and start the computation.
    pub fn run(&self, env: R, ctx: Context) -> BoxFuture<'static, Result<A>> {
        (self.run_fn)(env, ctx)
    }

    /// Supply only the outer environment.
    ///
    /// The result is the narrower computation that still needs a context,
    /// for call sites that only understand [`ReaderIOResult`].
    pub fn read(&self, env: R) -> ReaderIOResult<Context, A> {
        let run_fn = self.run_fn.clone();
        ReaderIOResult::new(move |ctx: Context| {
            let run_fn = run_fn.clone();
            let env = env.clone();
            IOResult::new(move || run_fn(env.clone(), ctx.clone()))
        })
    }
}

#[cfg(test)]
mod tests;
