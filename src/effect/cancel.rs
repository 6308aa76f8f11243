//! Combinators that bound a computation by its context.

use std::time::Duration;

use tokio::time::Instant;

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;

impl<R, A> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Make the whole computation respond to cancellation.
    ///
    /// The computation is not started on a done context, and is abandoned
    /// as soon as the context becomes done, even if its own steps never look
    /// at the context.
    pub fn with_context(self) -> Self {
        ReaderReaderIOResult::new(move |env, ctx: Context| {
            let fut = self.run(env, ctx.clone());
            async move { ctx.guard(fut).await }
        })
    }

    /// Run under a child context that expires after `timeout`.
    ///
    /// The caller's context is untouched; only this computation sees the
    /// tighter deadline.
    ///
    /// ```
    /// use std::time::Duration;
    /// use undertow::effect::from_async;
    /// use undertow::{Context, Error};
    ///
    /// # tokio_test::block_on(async {
    /// let slow = from_async(|_: (), _ctx: Context| async {
    ///     tokio::time::sleep(Duration::from_secs(60)).await;
    ///     Ok::<_, Error>(())
    /// });
    ///
    /// let bounded = slow.with_timeout(Duration::from_millis(5));
    /// let err = bounded.run((), Context::background()).await.unwrap_err();
    /// assert_eq!(err, Error::deadline_exceeded());
    /// # });
    /// ```
    pub fn with_timeout(self, timeout: Duration) -> Self {
        ReaderReaderIOResult::new(move |env, ctx: Context| {
            let this = self.clone();
            async move {
                // The child is derived on first poll, not when the future is built.
                let (child, handle) = ctx.with_timeout(timeout);
                let result = child.guard(this.run(env, child.clone())).await;
                handle.cancel();
                result
            }
        })
    }

    /// Run under a child context that expires at `deadline`.
    ///
    /// As with [`with_timeout`](Self::with_timeout), the inner computation
    /// is dropped when the deadline passes; a [`bracket`](crate::effect::bracket)
    /// inside still releases what it acquired.
    pub fn with_deadline(self, deadline: Instant) -> Self {
        ReaderReaderIOResult::new(move |env, ctx: Context| {
            let this = self.clone();
            async move {
                let (child, handle) = ctx.with_deadline(deadline);
                let result = child.guard(this.run(env, child.clone())).await;
                handle.cancel();
                result
            }
        })
    }
}
