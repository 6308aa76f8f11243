//! Adapting a computation to a different outer environment.
//!
//! Only the outer environment changes; the context is passed through as is.

use std::sync::Arc;

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;
use crate::error::Result;
use crate::io::IO;
use crate::io_result::IOResult;
use crate::reader_io_result::ReaderIOResult;

impl<R1, A> ReaderReaderIOResult<R1, A>
where
    R1: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Run against an environment derived purely from another one.
    ///
    /// ```
    /// use undertow::effect::asks;
    /// use undertow::Context;
    ///
    /// #[derive(Clone)]
    /// struct App { db_url: String }
    ///
    /// # tokio_test::block_on(async {
    /// let url_len = asks(|url: String| url.len());
    /// let in_app = url_len.local(|app: App| app.db_url);
    ///
    /// let app = App { db_url: "pg://db".into() };
    /// assert_eq!(in_app.run(app, Context::background()).await, Ok(7));
    /// # });
    /// ```
    pub fn local<R2, F>(self, f: F) -> ReaderReaderIOResult<R2, A>
    where
        R2: Clone + Send + Sync + 'static,
        F: Fn(R2) -> R1 + Send + Sync + 'static,
    {
        ReaderReaderIOResult::new(move |env: R2, ctx| self.run(f(env), ctx))
    }

    /// [`local`](Self::local) on the input and [`map`](Self::map) on the output.
    pub fn promap<R2, B, F, G>(self, f: F, g: G) -> ReaderReaderIOResult<R2, B>
    where
        R2: Clone + Send + Sync + 'static,
        B: Send + 'static,
        F: Fn(R2) -> R1 + Send + Sync + 'static,
        G: Fn(A) -> B + Send + Sync + 'static,
    {
        self.local(f).map(g)
    }

    /// Derive the environment with a function that may fail.
    ///
    /// A failure is returned without running this computation.
    pub fn local_result_k<R2, F>(self, f: F) -> ReaderReaderIOResult<R2, A>
    where
        R2: Clone + Send + Sync + 'static,
        F: Fn(R2) -> Result<R1> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env: R2, ctx: Context| {
            let this = self.clone();
            let f = f.clone();
            async move {
                let derived = f(env)?;
                this.run(derived, ctx).await
            }
        })
    }

    /// Derive the environment with an infallible effect.
    pub fn local_io_k<R2, F>(self, f: F) -> ReaderReaderIOResult<R2, A>
    where
        R2: Clone + Send + Sync + 'static,
        F: Fn(R2) -> IO<R1> + Send + Sync + 'static,
    {
        self.local_io_result_k(move |env| IOResult::from_io(f(env)))
    }

    /// Derive the environment with a fallible effect.
    ///
    /// The effect is guarded by the context like any other leaf.
    pub fn local_io_result_k<R2, F>(self, f: F) -> ReaderReaderIOResult<R2, A>
    where
        R2: Clone + Send + Sync + 'static,
        F: Fn(R2) -> IOResult<R1> + Send + Sync + 'static,
    {
        self.local_reader_io_result_k(move |env| ReaderIOResult::from_io_result(f(env)))
    }

    /// Derive the environment with a fallible effect that also reads the
    /// context.
    ///
    /// Useful when building the inner environment needs the caller's
    /// deadline, e.g. opening a connection under the request timeout.
    pub fn local_reader_io_result_k<R2, F>(self, f: F) -> ReaderReaderIOResult<R2, A>
    where
        R2: Clone + Send + Sync + 'static,
        F: Fn(R2) -> ReaderIOResult<Context, R1> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env: R2, ctx: Context| {
            let this = self.clone();
            let f = f.clone();
            async move {
                let deriving = f(env).run(ctx.clone());
                let derived = ctx.guard(deriving.run()).await?;
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                this.run(derived, ctx).await
            }
        })
    }
}
