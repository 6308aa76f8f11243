//! Constructors lifting plain values and narrower layers into
//! [`ReaderReaderIOResult`].
//!
//! Pure constructors ([`of`], [`left`], [`asks`], [`from_result`]) never look
//! at the context. Effectful lifts ([`from_io`], [`from_io_result`],
//! [`from_reader_io`], [`from_async`], ...) run their effect through
//! [`Context::guard`]: they fail with the cancellation error instead of
//! starting once the context is done, and give up waiting when it becomes done.

use std::future::Future;
use std::sync::Arc;

use futures::future;

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;
use crate::error::{Error, Result};
use crate::io::IO;
use crate::io_result::IOResult;
use crate::reader::Reader;
use crate::reader_io::ReaderIO;
use crate::reader_io_result::ReaderIOResult;

impl<R, A> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Succeed with a clone of `value`.
    ///
    /// ```
    /// use undertow::{Context, ReaderReaderIOResult};
    ///
    /// # tokio_test::block_on(async {
    /// let answer = ReaderReaderIOResult::<(), _>::of(42);
    /// assert_eq!(answer.run((), Context::background()).await, Ok(42));
    /// # });
    /// ```
    pub fn of(value: A) -> Self
    where
        A: Clone + Sync,
    {
        ReaderReaderIOResult::new(move |_, _| future::ok(value.clone()))
    }

    /// Alias of [`ReaderReaderIOResult::of`].
    pub fn right(value: A) -> Self
    where
        A: Clone + Sync,
    {
        ReaderReaderIOResult::of(value)
    }

    /// Fail with `error`.
    pub fn left(error: Error) -> Self {
        ReaderReaderIOResult::new(move |_, _| future::err(error.clone()))
    }
}

/// Succeed with a clone of `value`, ignoring environment and context.
pub fn of<R, A>(value: A) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    ReaderReaderIOResult::of(value)
}

/// Alias of [`of`].
pub fn right<R, A>(value: A) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    ReaderReaderIOResult::right(value)
}

/// Fail with `error`.
pub fn left<R, A>(error: Error) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    ReaderReaderIOResult::left(error)
}

/// Yield the outer environment itself.
pub fn ask<R>() -> ReaderReaderIOResult<R, R>
where
    R: Clone + Send + Sync + 'static,
{
    ReaderReaderIOResult::new(|env: R, _| future::ok(env))
}

/// Project a value out of the outer environment.
///
/// ```
/// use undertow::effect::asks;
/// use undertow::Context;
///
/// #[derive(Clone)]
/// struct Config { retries: u32 }
///
/// # tokio_test::block_on(async {
/// let retries = asks(|c: Config| c.retries);
/// assert_eq!(retries.run(Config { retries: 3 }, Context::background()).await, Ok(3));
/// # });
/// ```
pub fn asks<R, A, F>(f: F) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
    F: Fn(R) -> A + Send + Sync + 'static,
{
    ReaderReaderIOResult::new(move |env: R, _| future::ok(f(env)))
}

/// Lift a pure [`Reader`] over the outer environment.
pub fn from_reader<R, A>(reader: Reader<R, A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    asks(move |env| reader.run(env))
}

/// Lift a reader that may fail.
pub fn from_reader_result<R, A>(reader: Reader<R, Result<A>>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    ReaderReaderIOResult::new(move |env: R, _| future::ready(reader.run(env)))
}

/// Lift an already computed result.
pub fn from_result<R, A>(result: Result<A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    ReaderReaderIOResult::new(move |_, _| future::ready(result.clone()))
}

/// Turn an `Option` into a computation, failing with `on_none()` for `None`.
///
/// ```
/// use undertow::effect::from_option;
/// use undertow::{Context, Error};
///
/// # tokio_test::block_on(async {
/// let require = from_option::<(), i32, _>(|| Error::msg("missing"));
///
/// assert_eq!(require(Some(1)).run((), Context::background()).await, Ok(1));
/// assert_eq!(require(None).run((), Context::background()).await, Err(Error::msg("missing")));
/// # });
/// ```
pub fn from_option<R, A, F>(on_none: F) -> impl Fn(Option<A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    F: Fn() -> Error,
{
    move |value| match value {
        Some(value) => of(value),
        None => left(on_none()),
    }
}

/// Accept values satisfying `predicate`, failing with `on_false(&value)` otherwise.
pub fn from_predicate<R, A, P, F>(
    predicate: P,
    on_false: F,
) -> impl Fn(A) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    P: Fn(&A) -> bool,
    F: Fn(&A) -> Error,
{
    move |value| {
        if predicate(&value) {
            of(value)
        } else {
            left(on_false(&value))
        }
    }
}

/// Lift an infallible effect.
pub fn from_io<R, A>(io: IO<A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    ReaderReaderIOResult::new(move |_, ctx: Context| {
        let io = io.clone();
        async move { ctx.guard(async move { Ok(io.run().await) }).await }
    })
}

/// Lift a fallible effect.
pub fn from_io_result<R, A>(io: IOResult<A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    ReaderReaderIOResult::new(move |_, ctx: Context| {
        let io = io.clone();
        async move { ctx.guard(io.run()).await }
    })
}

/// Lift an infallible effect that reads the outer environment.
pub fn from_reader_io<R, A>(rio: ReaderIO<R, A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    ReaderReaderIOResult::new(move |env: R, ctx: Context| {
        let io = rio.run(env);
        async move { ctx.guard(async move { Ok(io.run().await) }).await }
    })
}

/// Lift a fallible effect that reads the outer environment.
pub fn from_reader_io_result<R, A>(rior: ReaderIOResult<R, A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    ReaderReaderIOResult::new(move |env: R, ctx: Context| {
        let io = rior.run(env);
        async move { ctx.guard(io.run()).await }
    })
}

/// Lift a computation that only needs the context.
///
/// This is the inverse of [`read`](ReaderReaderIOResult::read): the lifted
/// computation ignores the outer environment.
pub fn from_context_reader<R, A>(rior: ReaderIOResult<Context, A>) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    ReaderReaderIOResult::new(move |_, ctx: Context| {
        let io = rior.run(ctx.clone());
        async move { ctx.guard(io.run()).await }
    })
}

/// Build a leaf from an async function of the environment and context.
///
/// The function runs under [`Context::guard`], so it is never started on a
/// done context and is abandoned at its next suspension point once the
/// context becomes done.
///
/// ```
/// use undertow::effect::from_async;
/// use undertow::{Context, Error};
///
/// #[derive(Clone)]
/// struct Env { base: u64 }
///
/// # tokio_test::block_on(async {
/// let fetch = from_async(|env: Env, _ctx: Context| async move {
///     Ok::<_, Error>(env.base + 1)
/// });
///
/// assert_eq!(fetch.run(Env { base: 41 }, Context::background()).await, Ok(42));
///
/// let (ctx, cancel) = Context::background().with_cancel();
/// cancel.cancel();
/// assert!(fetch.run(Env { base: 41 }, ctx).await.unwrap_err().is_cancellation());
/// # });
/// ```
pub fn from_async<R, A, F, Fut>(f: F) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
    F: Fn(R, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<A>> + Send + 'static,
{
    let f = Arc::new(f);
    ReaderReaderIOResult::new(move |env: R, ctx: Context| {
        let f = f.clone();
        async move {
            // `guard` checks again, but `f` must not even be called here.
            if let Some(err) = ctx.err() {
                return Err(err);
            }
            let fut = f(env, ctx.clone());
            ctx.guard(fut).await
        }
    })
}
