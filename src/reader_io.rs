//! Environment-dependent deferred computations.
//!
//! [`ReaderIO<R, A>`] reads an environment to build an [`IO`]. Supplying the
//! environment still runs nothing; effects happen when the resulting `IO` runs.

use std::fmt;
use std::sync::Arc;

use crate::io::IO;
use crate::reader::Reader;

/// A function from an environment to a deferred computation.
pub struct ReaderIO<R, A> {
    f: Arc<dyn Fn(R) -> IO<A> + Send + Sync>,
}

impl<R, A> Clone for ReaderIO<R, A> {
    fn clone(&self) -> Self {
        ReaderIO { f: self.f.clone() }
    }
}

impl<R, A> fmt::Debug for ReaderIO<R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderIO").field("f", &"<function>").finish()
    }
}

impl<R, A> ReaderIO<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a `ReaderIO` from a function producing an `IO`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(R) -> IO<A> + Send + Sync + 'static,
    {
        ReaderIO { f: Arc::new(f) }
    }

    /// Yield a clone of `value`, ignoring the environment.
    pub fn of(value: A) -> Self
    where
        A: Clone + Sync,
    {
        let io = IO::of(value);
        ReaderIO::new(move |_| io.clone())
    }

    /// Lift an `IO` that does not need the environment.
    pub fn from_io(io: IO<A>) -> Self {
        ReaderIO::new(move |_| io.clone())
    }

    /// Lift a pure reader.
    pub fn from_reader(reader: Reader<R, A>) -> Self {
        ReaderIO::new(move |env: R| {
            let reader = reader.clone();
            IO::from_fn(move || reader.run(env.clone()))
        })
    }

    /// Project a value out of the environment.
    pub fn asks<F>(f: F) -> Self
    where
        F: Fn(R) -> A + Send + Sync + 'static,
    {
        ReaderIO::from_reader(Reader::new(f))
    }

    /// Supply the environment.
    pub fn run(&self, env: R) -> IO<A> {
        (self.f)(env)
    }

    /// Transform the produced value.
    pub fn map<B, F>(self, f: F) -> ReaderIO<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderIO::new(move |env| {
            let f = f.clone();
            self.run(env).map(move |a| f(a))
        })
    }

    /// Sequence a dependent computation, sharing the environment.
    pub fn chain<B, F>(self, f: F) -> ReaderIO<R, B>
    where
        B: Send + 'static,
        F: Fn(A) -> ReaderIO<R, B> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ReaderIO::new(move |env: R| {
            let f = f.clone();
            let next_env = env.clone();
            self.run(env).chain(move |a| f(a).run(next_env.clone()))
        })
    }

    /// Run against an environment derived from another one.
    pub fn local<R2, F>(self, f: F) -> ReaderIO<R2, A>
    where
        R2: Clone + Send + Sync + 'static,
        F: Fn(R2) -> R + Send + Sync + 'static,
    {
        ReaderIO::new(move |env| self.run(f(env)))
    }
}

impl<R> ReaderIO<R, R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Yield the environment itself.
    pub fn ask() -> Self {
        ReaderIO::new(IO::of)
    }
}
