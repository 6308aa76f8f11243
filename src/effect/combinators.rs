//! Functor, monad and alternative combinators, plus the `*_k` family that
//! chains into narrower layers.

use std::sync::Arc;

use futures::future;

use crate::context::Context;
use crate::effect::constructors::{from_io, from_io_result, from_reader_io};
use crate::effect::ReaderReaderIOResult;
use crate::error::{Error, Result};
use crate::io::IO;
use crate::io_result::IOResult;
use crate::reader::Reader;
use crate::reader_io::ReaderIO;

impl<R, A> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Transform the success value.
    pub fn map<B, F>(self, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env, ctx| {
            let fut = self.run(env, ctx);
            let f = f.clone();
            async move { fut.await.map(|a| f(a)) }
        })
    }

    /// Replace the success value with a clone of `value`.
    pub fn map_to<B>(self, value: B) -> ReaderReaderIOResult<R, B>
    where
        B: Clone + Send + Sync + 'static,
    {
        self.map(move |_| value.clone())
    }

    /// Transform the error value.
    pub fn map_left<F>(self, f: F) -> Self
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env, ctx| {
            let fut = self.run(env, ctx);
            let f = f.clone();
            async move { fut.await.map_err(|e| f(e)) }
        })
    }

    /// Transform the error and the success value at once.
    pub fn bimap<B, FE, FA>(self, on_err: FE, on_ok: FA) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        FE: Fn(Error) -> Error + Send + Sync + 'static,
        FA: Fn(A) -> B + Send + Sync + 'static,
    {
        self.map_left(on_err).map(on_ok)
    }

    /// Sequence a dependent computation after a success.
    ///
    /// Environment and context flow unchanged into the continuation. The
    /// context is checked before `f` is invoked, so a context cancelled while
    /// the first step ran stops the sequence there.
    ///
    /// ```
    /// use undertow::effect::{asks, of};
    /// use undertow::Context;
    ///
    /// # tokio_test::block_on(async {
    /// let total = asks(|rate: u32| rate).chain(|rate| of(rate * 12));
    /// assert_eq!(total.run(10, Context::background()).await, Ok(120));
    /// # });
    /// ```
    pub fn chain<B, F>(self, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> ReaderReaderIOResult<R, B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env: R, ctx: Context| {
            let first = self.run(env.clone(), ctx.clone());
            let f = f.clone();
            async move {
                let a = first.await?;
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                f(a).run(env, ctx).await
            }
        })
    }

    /// Run a dependent computation for its effects and keep this value.
    ///
    /// A failure of the dependent computation fails the whole.
    pub fn chain_first<B, F>(self, f: F) -> Self
    where
        B: Send + 'static,
        F: Fn(&A) -> ReaderReaderIOResult<R, B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env: R, ctx: Context| {
            let first = self.run(env.clone(), ctx.clone());
            let f = f.clone();
            async move {
                let a = first.await?;
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                f(&a).run(env, ctx).await?;
                Ok(a)
            }
        })
    }

    /// Observe the success value without changing it.
    pub fn tap<F>(self, f: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env, ctx| {
            let fut = self.run(env, ctx);
            let f = f.clone();
            async move {
                let a = fut.await?;
                f(&a);
                Ok(a)
            }
        })
    }

    /// Recover from an error with a new computation.
    ///
    /// Only domain errors are recovered. A cancellation error, or any error
    /// seen once the context is done, is returned without calling `f`.
    pub fn chain_left<F>(self, f: F) -> Self
    where
        F: Fn(Error) -> ReaderReaderIOResult<R, A> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env: R, ctx: Context| {
            let first = self.run(env.clone(), ctx.clone());
            let f = f.clone();
            async move {
                match first.await {
                    Ok(a) => Ok(a),
                    Err(e) if e.is_cancellation() => Err(e),
                    Err(e) => match ctx.err() {
                        Some(cancelled) => Err(cancelled),
                        None => f(e).run(env, ctx).await,
                    },
                }
            }
        })
    }

    /// Fall back to the computation built by `second` if this one fails.
    ///
    /// `second` is only invoked on a domain failure; on success or
    /// cancellation it is never called and none of its effects run.
    pub fn alt<F>(self, second: F) -> Self
    where
        F: Fn() -> ReaderReaderIOResult<R, A> + Send + Sync + 'static,
    {
        self.chain_left(move |_| second())
    }

    /// Recover from any error with a plain value.
    ///
    /// The result cannot fail, so it is expressed with the infallible layers:
    /// a reader of the environment producing a reader of the context.
    pub fn get_or_else<F>(self, on_err: F) -> Reader<R, ReaderIO<Context, A>>
    where
        F: Fn(Error) -> A + Send + Sync + 'static,
    {
        let on_err = Arc::new(on_err);
        Reader::new(move |env: R| {
            let this = self.clone();
            let on_err = on_err.clone();
            ReaderIO::new(move |ctx: Context| {
                let this = this.clone();
                let env = env.clone();
                let on_err = on_err.clone();
                IO::new(move || {
                    let fut = this.run(env.clone(), ctx.clone());
                    let on_err = on_err.clone();
                    async move { fut.await.unwrap_or_else(|e| on_err(e)) }
                })
            })
        })
    }

    /// Run this computation and `other` concurrently and pair their results.
    ///
    /// When both fail, this computation's error is reported.
    pub fn zip<B>(self, other: ReaderReaderIOResult<R, B>) -> ReaderReaderIOResult<R, (A, B)>
    where
        B: Send + 'static,
    {
        ReaderReaderIOResult::new(move |env: R, ctx: Context| {
            let left = self.run(env.clone(), ctx.clone());
            let right = other.run(env, ctx);
            async move {
                let (a, b) = future::join(left, right).await;
                Ok((a?, b?))
            }
        })
    }

    /// Apply the function produced by this computation to the value produced
    /// by `fa`.
    ///
    /// Both sides run concurrently. When both fail, the error of the
    /// function side is reported.
    ///
    /// ```
    /// use undertow::effect::of;
    /// use undertow::Context;
    ///
    /// # tokio_test::block_on(async {
    /// let double = of::<(), _>(|n: i32| n * 2);
    /// assert_eq!(double.ap(of(21)).run((), Context::background()).await, Ok(42));
    /// # });
    /// ```
    pub fn ap<X, B>(self, fa: ReaderReaderIOResult<R, X>) -> ReaderReaderIOResult<R, B>
    where
        A: FnOnce(X) -> B,
        X: Send + 'static,
        B: Send + 'static,
    {
        self.zip(fa).map(|(f, x)| f(x))
    }

    /// Sequential [`ap`](Self::ap): `fa` only starts after the function side
    /// succeeded.
    pub fn ap_seq<X, B>(self, fa: ReaderReaderIOResult<R, X>) -> ReaderReaderIOResult<R, B>
    where
        A: FnOnce(X) -> B,
        X: Send + 'static,
        B: Send + 'static,
    {
        ReaderReaderIOResult::new(move |env: R, ctx: Context| {
            let first = self.run(env.clone(), ctx.clone());
            let fa = fa.clone();
            async move {
                let f = first.await?;
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                let x = fa.run(env, ctx).await?;
                Ok(f(x))
            }
        })
    }

    /// Chain into a plain result-producing function.
    pub fn chain_result_k<B, F>(self, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Result<B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env, ctx| {
            let fut = self.run(env, ctx);
            let f = f.clone();
            async move { fut.await.and_then(|a| f(a)) }
        })
    }

    /// Chain into a function returning an [`Option`], failing with
    /// `on_none()` when it returns `None`.
    pub fn chain_option_k<B, N, F>(self, on_none: N, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        N: Fn() -> Error + Send + Sync + 'static,
        F: Fn(A) -> Option<B> + Send + Sync + 'static,
    {
        self.chain_result_k(move |a| f(a).ok_or_else(&on_none))
    }

    /// Chain into an infallible effect.
    pub fn chain_io_k<B, F>(self, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> IO<B> + Send + Sync + 'static,
    {
        self.chain(move |a| from_io(f(a)))
    }

    /// Chain into a fallible effect.
    pub fn chain_io_result_k<B, F>(self, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> IOResult<B> + Send + Sync + 'static,
    {
        self.chain(move |a| from_io_result(f(a)))
    }

    /// Chain into a pure reader of the outer environment.
    pub fn chain_reader_k<B, F>(self, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Reader<R, B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env: R, ctx| {
            let fut = self.run(env.clone(), ctx);
            let f = f.clone();
            async move { fut.await.map(|a| f(a).run(env)) }
        })
    }

    /// Chain into an infallible effect that reads the outer environment.
    pub fn chain_reader_io_k<B, F>(self, f: F) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> ReaderIO<R, B> + Send + Sync + 'static,
    {
        self.chain(move |a| from_reader_io(f(a)))
    }

    /// Run an infallible effect built from the value and keep the value.
    pub fn chain_first_io_k<B, F>(self, f: F) -> Self
    where
        B: Send + 'static,
        F: Fn(&A) -> IO<B> + Send + Sync + 'static,
    {
        self.chain_first(move |a| from_io(f(a)))
    }
}

impl<R, A> ReaderReaderIOResult<R, ReaderReaderIOResult<R, A>>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Remove one level of nesting.
    pub fn flatten(self) -> ReaderReaderIOResult<R, A> {
        self.chain(|inner| inner)
    }
}
