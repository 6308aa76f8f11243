//! Flipping nested environments.
//!
//! A computation over `R2` whose value is itself something over `R1` can be
//! turned into a function that takes `R1` first and yields a single
//! computation over `R2`. This lets a caller fix one environment early (for
//! instance a per-tenant configuration) and hand the rest on.

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;
use crate::reader::Reader;
use crate::reader_io::ReaderIO;
use crate::reader_io_result::ReaderIOResult;

/// Flip a computation producing a computation.
///
/// The outer computation runs first with `R2`; the inner one then runs with
/// `R1`, both under the same context.
///
/// ```
/// use undertow::effect::{asks, sequence};
/// use undertow::Context;
///
/// # tokio_test::block_on(async {
/// // Outer environment: a prefix. Inner environment: a name.
/// let nested = asks(|prefix: &'static str| {
///     asks(move |name: String| format!("{}{}", prefix, name))
/// });
///
/// let flipped = sequence(nested);
/// let greet = flipped.run("ada".to_string());
/// assert_eq!(greet.run("hi ", Context::background()).await, Ok("hi ada".to_string()));
/// # });
/// ```
pub fn sequence<R1, R2, A>(
    ma: ReaderReaderIOResult<R2, ReaderReaderIOResult<R1, A>>,
) -> Reader<R1, ReaderReaderIOResult<R2, A>>
where
    R1: Clone + Send + Sync + 'static,
    R2: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    Reader::new(move |r1: R1| {
        let ma = ma.clone();
        ReaderReaderIOResult::new(move |r2: R2, ctx: Context| {
            let outer = ma.run(r2, ctx.clone());
            let r1 = r1.clone();
            async move {
                let inner = outer.await?;
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                inner.run(r1, ctx).await
            }
        })
    })
}

/// Flip a computation producing a pure [`Reader`].
pub fn sequence_reader<R1, R2, A>(
    ma: ReaderReaderIOResult<R2, Reader<R1, A>>,
) -> Reader<R1, ReaderReaderIOResult<R2, A>>
where
    R1: Clone + Send + Sync + 'static,
    R2: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    Reader::new(move |r1: R1| ma.clone().map(move |reader| reader.run(r1.clone())))
}

/// Flip a computation producing a [`ReaderIO`].
pub fn sequence_reader_io<R1, R2, A>(
    ma: ReaderReaderIOResult<R2, ReaderIO<R1, A>>,
) -> Reader<R1, ReaderReaderIOResult<R2, A>>
where
    R1: Clone + Send + Sync + 'static,
    R2: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    Reader::new(move |r1: R1| {
        ma.clone()
            .chain_io_k(move |rio: ReaderIO<R1, A>| rio.run(r1.clone()))
    })
}

/// Flip a computation producing a [`ReaderIOResult`].
pub fn sequence_reader_io_result<R1, R2, A>(
    ma: ReaderReaderIOResult<R2, ReaderIOResult<R1, A>>,
) -> Reader<R1, ReaderReaderIOResult<R2, A>>
where
    R1: Clone + Send + Sync + 'static,
    R2: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    Reader::new(move |r1: R1| {
        ma.clone()
            .chain_io_result_k(move |rior: ReaderIOResult<R1, A>| rior.run(r1.clone()))
    })
}

/// Map with a function returning a computation over `R1`, then flip.
pub fn traverse<R1, R2, A, B, F>(
    ma: ReaderReaderIOResult<R2, A>,
    f: F,
) -> Reader<R1, ReaderReaderIOResult<R2, B>>
where
    R1: Clone + Send + Sync + 'static,
    R2: Clone + Send + Sync + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> ReaderReaderIOResult<R1, B> + Send + Sync + 'static,
{
    sequence(ma.map(f))
}

/// Map with a function returning a pure [`Reader`] over `R1`, then flip.
pub fn traverse_reader<R1, R2, A, B, F>(
    ma: ReaderReaderIOResult<R2, A>,
    f: F,
) -> Reader<R1, ReaderReaderIOResult<R2, B>>
where
    R1: Clone + Send + Sync + 'static,
    R2: Clone + Send + Sync + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> Reader<R1, B> + Send + Sync + 'static,
{
    sequence_reader(ma.map(f))
}
