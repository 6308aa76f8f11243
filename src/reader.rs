//! Pure functions of an environment.
//!
//! A [`Reader<R, A>`] computes an `A` from an environment `R`. It performs no
//! effects and cannot fail; it exists so environment-dependent values can be
//! composed before the environment is known.
//!
//! ```
//! use undertow::Reader;
//!
//! #[derive(Clone)]
//! struct Config { port: u16, host: String }
//!
//! let address = Reader::asks(|c: Config| c.host)
//!     .chain(|host| Reader::asks(move |c: Config| format!("{}:{}", host, c.port)));
//!
//! let config = Config { port: 8080, host: "localhost".into() };
//! assert_eq!(address.run(config), "localhost:8080");
//! ```

use std::fmt;
use std::sync::Arc;

/// A computation that reads an environment `R` to produce an `A`.
pub struct Reader<R, A> {
    f: Arc<dyn Fn(R) -> A + Send + Sync>,
}

impl<R, A> Clone for Reader<R, A> {
    fn clone(&self) -> Self {
        Reader { f: self.f.clone() }
    }
}

impl<R, A> fmt::Debug for Reader<R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").field("f", &"<function>").finish()
    }
}

impl<R, A> Reader<R, A>
where
    R: 'static,
    A: 'static,
{
    /// Create a reader from a function of the environment.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(R) -> A + Send + Sync + 'static,
    {
        Reader { f: Arc::new(f) }
    }

    /// A reader that ignores the environment.
    pub fn of(value: A) -> Self
    where
        A: Clone + Send + Sync,
    {
        Reader::new(move |_| value.clone())
    }

    /// Project a value out of the environment.
    pub fn asks<F>(f: F) -> Self
    where
        F: Fn(R) -> A + Send + Sync + 'static,
    {
        Reader::new(f)
    }

    /// Supply the environment.
    pub fn run(&self, env: R) -> A {
        (self.f)(env)
    }

    /// Transform the produced value.
    pub fn map<B, F>(self, f: F) -> Reader<R, B>
    where
        B: 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Reader::new(move |env| f(self.run(env)))
    }

    /// Sequence a reader that depends on this one's value, sharing the environment.
    pub fn chain<B, F>(self, f: F) -> Reader<R, B>
    where
        R: Clone,
        B: 'static,
        F: Fn(A) -> Reader<R, B> + Send + Sync + 'static,
    {
        Reader::new(move |env: R| f(self.run(env.clone())).run(env))
    }

    /// Run this reader against an environment derived from another one.
    pub fn local<R2, F>(self, f: F) -> Reader<R2, A>
    where
        R2: 'static,
        F: Fn(R2) -> R + Send + Sync + 'static,
    {
        Reader::new(move |env| self.run(f(env)))
    }
}

impl<R> Reader<R, R>
where
    R: 'static,
{
    /// The reader that returns the environment itself.
    pub fn ask() -> Self {
        Reader::new(|env| env)
    }
}
