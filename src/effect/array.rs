//! Running many computations and collecting their values.
//!
//! The sequential variants run items in order, stop at the first failure and
//! check the context between items. The `_par` variants start every item
//! concurrently; when several fail, the error of the lowest index is reported.

use futures::future;

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;

/// Run computations one after another, collecting their values in order.
///
/// ```
/// use undertow::effect::{asks, of, sequence_array};
/// use undertow::Context;
///
/// # tokio_test::block_on(async {
/// let all = sequence_array(vec![of(1), asks(|n: i32| n), of(3)]);
/// assert_eq!(all.run(2, Context::background()).await, Ok(vec![1, 2, 3]));
/// # });
/// ```
pub fn sequence_array<R, A, I>(items: I) -> ReaderReaderIOResult<R, Vec<A>>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
    I: IntoIterator<Item = ReaderReaderIOResult<R, A>>,
{
    let items: Vec<_> = items.into_iter().collect();
    ReaderReaderIOResult::new(move |env: R, ctx: Context| {
        let items = items.clone();
        async move {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                values.push(item.run(env.clone(), ctx.clone()).await?);
            }
            Ok(values)
        }
    })
}

/// Build a computation for each item and run them one after another.
///
/// `f` is applied when the traversal is built; the computations it returns
/// only run when the result runs.
pub fn traverse_array<R, A, B, I, F>(items: I, f: F) -> ReaderReaderIOResult<R, Vec<B>>
where
    R: Clone + Send + Sync + 'static,
    B: Send + 'static,
    I: IntoIterator<Item = A>,
    F: Fn(A) -> ReaderReaderIOResult<R, B>,
{
    sequence_array(items.into_iter().map(f))
}

/// [`traverse_array`] with the index of each item.
pub fn traverse_array_with_index<R, A, B, I, F>(
    items: I,
    f: F,
) -> ReaderReaderIOResult<R, Vec<B>>
where
    R: Clone + Send + Sync + 'static,
    B: Send + 'static,
    I: IntoIterator<Item = A>,
    F: Fn(usize, A) -> ReaderReaderIOResult<R, B>,
{
    sequence_array(items.into_iter().enumerate().map(|(i, a)| f(i, a)))
}

/// Run computations concurrently, collecting their values in input order.
pub fn sequence_array_par<R, A, I>(items: I) -> ReaderReaderIOResult<R, Vec<A>>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
    I: IntoIterator<Item = ReaderReaderIOResult<R, A>>,
{
    let items: Vec<_> = items.into_iter().collect();
    ReaderReaderIOResult::new(move |env: R, ctx: Context| {
        let running: Vec<_> = items
            .iter()
            .map(|item| item.run(env.clone(), ctx.clone()))
            .collect();
        async move { future::join_all(running).await.into_iter().collect() }
    })
}

/// Build a computation for each item and run them concurrently.
pub fn traverse_array_par<R, A, B, I, F>(items: I, f: F) -> ReaderReaderIOResult<R, Vec<B>>
where
    R: Clone + Send + Sync + 'static,
    B: Send + 'static,
    I: IntoIterator<Item = A>,
    F: Fn(A) -> ReaderReaderIOResult<R, B>,
{
    sequence_array_par(items.into_iter().map(f))
}
