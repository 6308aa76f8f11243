//! Deferred effectful computations.
//!
//! [`IO<A>`] is a zero-argument thunk producing a future of `A`. Nothing runs
//! when an `IO` is built or composed; side effects happen only when the future
//! returned by [`IO::run`] is awaited. An `IO` can be run any number of times,
//! and each run performs its effects again.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use undertow::IO;
//!
//! # tokio_test::block_on(async {
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = calls.clone();
//! let io = IO::from_fn(move || counter.fetch_add(1, Ordering::SeqCst) + 1).map(|n| n * 10);
//!
//! assert_eq!(calls.load(Ordering::SeqCst), 0); // nothing ran yet
//! assert_eq!(io.run().await, 10);
//! assert_eq!(io.run().await, 20);
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::time::Instant;

type Thunk<A> = dyn Fn() -> BoxFuture<'static, A> + Send + Sync;

/// A deferred computation producing an `A`.
pub struct IO<A> {
    thunk: Arc<Thunk<A>>,
}

impl<A> Clone for IO<A> {
    fn clone(&self) -> Self {
        IO {
            thunk: self.thunk.clone(),
        }
    }
}

impl<A> fmt::Debug for IO<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IO").field("thunk", &"<function>").finish()
    }
}

impl<A> IO<A>
where
    A: Send + 'static,
{
    /// Create an `IO` from an async thunk.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = A> + Send + 'static,
    {
        IO {
            thunk: Arc::new(move || f().boxed()),
        }
    }

    /// Create an `IO` from a synchronous thunk, invoked each time the future
    /// returned by [`run`](Self::run) is first polled.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        IO::new(move || {
            let f = f.clone();
            async move { f() }
        })
    }

    /// An `IO` that yields a clone of `value` without side effects.
    pub fn of(value: A) -> Self
    where
        A: Clone + Sync,
    {
        IO::new(move || future::ready(value.clone()))
    }

    /// Start the computation.
    pub fn run(&self) -> BoxFuture<'static, A> {
        (self.thunk)()
    }

    /// Transform the produced value.
    pub fn map<B, F>(self, f: F) -> IO<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        IO::new(move || {
            let fut = self.run();
            let f = f.clone();
            async move { f(fut.await) }
        })
    }

    /// Sequence a dependent `IO` after this one.
    pub fn chain<B, F>(self, f: F) -> IO<B>
    where
        B: Send + 'static,
        F: Fn(A) -> IO<B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        IO::new(move || {
            let fut = self.run();
            let f = f.clone();
            async move { f(fut.await).run().await }
        })
    }

    /// Run a dependent `IO` for its effects and keep this value.
    pub fn chain_first<B, F>(self, f: F) -> IO<A>
    where
        B: Send + 'static,
        F: Fn(&A) -> IO<B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        IO::new(move || {
            let fut = self.run();
            let f = f.clone();
            async move {
                let value = fut.await;
                f(&value).run().await;
                value
            }
        })
    }
}

impl IO<()> {
    /// An `IO` that waits for `duration` on the tokio timer.
    pub fn sleep(duration: Duration) -> IO<()> {
        IO::new(move || tokio::time::sleep(duration))
    }
}

impl IO<Instant> {
    /// An `IO` that reads the current instant each time it runs.
    pub fn now() -> IO<Instant> {
        IO::from_fn(Instant::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_of_returns_value() {
        assert_eq!(IO::of(42).run().await, 42);
    }

    #[tokio::test]
    async fn test_effects_are_deferred_until_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let io = IO::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .map(|_| "done");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(io.run().await, "done");
        assert_eq!(io.run().await, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_chain_sequences_dependent_io() {
        let io = IO::of(20).chain(|x| IO::of(x + 1)).map(|x| x * 2);
        assert_eq!(io.run().await, 42);
    }

    #[tokio::test]
    async fn test_chain_first_keeps_original_value() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = seen.clone();
        let io = IO::of(7).chain_first(move |x| {
            let sink = sink.clone();
            let x = *x;
            IO::from_fn(move || sink.store(x, Ordering::SeqCst))
        });

        assert_eq!(io.run().await, 7);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_waits_on_timer() {
        let start = Instant::now();
        IO::sleep(Duration::from_secs(5)).run().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_debug_hides_thunk() {
        let debug = format!("{:?}", IO::of(1));
        assert!(debug.contains("IO"));
        assert!(debug.contains("<function>"));
    }
}
