//! Tracing support.

use tracing::Instrument as _;

use crate::effect::ReaderReaderIOResult;

impl<R, A> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Run every execution of this computation inside `span`.
    ///
    /// The span is entered whenever the computation is polled, following the
    /// standard `tracing::Instrument` pattern for async code.
    ///
    /// ```rust
    /// use undertow::effect::of;
    /// use undertow::Context;
    ///
    /// # tokio_test::block_on(async {
    /// let order_id = 42;
    /// let fetch = of::<(), _>("order")
    ///     .instrument(tracing::debug_span!("fetch_order", order_id));
    ///
    /// assert_eq!(fetch.run((), Context::background()).await, Ok("order"));
    /// # });
    /// ```
    pub fn instrument(self, span: tracing::Span) -> Self {
        ReaderReaderIOResult::new(move |env, ctx| self.run(env, ctx).instrument(span.clone()))
    }
}
