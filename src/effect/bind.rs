//! Do-notation: building up a state record one step at a time.
//!
//! Start from [`do_`] with an initial state, then add fields with
//! [`bind`](ReaderReaderIOResult::bind) (effectful, may depend on the state
//! so far), [`let_`](ReaderReaderIOResult::let_) (pure),
//! [`let_to`](ReaderReaderIOResult::let_to) (constant) or
//! [`ap_s`](ReaderReaderIOResult::ap_s) (effectful, independent of the state,
//! run concurrently with the steps before it). The first failing step ends
//! the pipeline.
//!
//! ```
//! use undertow::effect::{asks, do_, of};
//! use undertow::Context;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Order { user: String, total: u32, shipping: u32 }
//!
//! # tokio_test::block_on(async {
//! let order = do_::<u32, _>(Order::default())
//!     .bind(|s, user| Order { user, ..s }, |_| of("ada".to_string()))
//!     .bind(|s, total| Order { total, ..s }, |_| asks(|price: u32| price * 2))
//!     .let_(|s, shipping| Order { shipping, ..s }, |s| if s.total > 100 { 0 } else { 5 });
//!
//! let expected = Order { user: "ada".into(), total: 60, shipping: 5 };
//! assert_eq!(order.run(30, Context::background()).await, Ok(expected));
//! # });
//! ```
//!
//! The `_l` variants take a [`Lens`] instead of a setter and read the focused
//! field instead of the whole state.

use std::sync::Arc;

use futures::future;

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;
use crate::optics::Lens;

/// Start a do-notation pipeline from an initial state.
pub fn do_<R, S>(state: S) -> ReaderReaderIOResult<R, S>
where
    R: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    ReaderReaderIOResult::of(state)
}

impl<R, S1> ReaderReaderIOResult<R, S1>
where
    R: Clone + Send + Sync + 'static,
    S1: Send + 'static,
{
    /// Run an effect that depends on the state and store its value with `setter`.
    pub fn bind<S2, T, Set, F>(self, setter: Set, f: F) -> ReaderReaderIOResult<R, S2>
    where
        S2: Send + 'static,
        T: Send + 'static,
        Set: Fn(S1, T) -> S2 + Send + Sync + 'static,
        F: Fn(&S1) -> ReaderReaderIOResult<R, T> + Send + Sync + 'static,
    {
        let setter = Arc::new(setter);
        let f = Arc::new(f);
        ReaderReaderIOResult::new(move |env: R, ctx: Context| {
            let first = self.run(env.clone(), ctx.clone());
            let setter = setter.clone();
            let f = f.clone();
            async move {
                let s1 = first.await?;
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                let t = f(&s1).run(env, ctx).await?;
                Ok(setter(s1, t))
            }
        })
    }

    /// Compute a value purely from the state and store it with `setter`.
    pub fn let_<S2, T, Set, F>(self, setter: Set, f: F) -> ReaderReaderIOResult<R, S2>
    where
        S2: Send + 'static,
        Set: Fn(S1, T) -> S2 + Send + Sync + 'static,
        F: Fn(&S1) -> T + Send + Sync + 'static,
    {
        self.map(move |s1| {
            let t = f(&s1);
            setter(s1, t)
        })
    }

    /// Store a constant with `setter`.
    pub fn let_to<S2, T, Set>(self, setter: Set, value: T) -> ReaderReaderIOResult<R, S2>
    where
        S2: Send + 'static,
        T: Clone + Send + Sync + 'static,
        Set: Fn(S1, T) -> S2 + Send + Sync + 'static,
    {
        self.map(move |s1| setter(s1, value.clone()))
    }

    /// Start a pipeline by wrapping the current value into a state.
    pub fn bind_to<S2, Set>(self, setter: Set) -> ReaderReaderIOResult<R, S2>
    where
        S2: Send + 'static,
        Set: Fn(S1) -> S2 + Send + Sync + 'static,
    {
        self.map(setter)
    }

    /// Run an independent effect concurrently with this pipeline and store
    /// its value with `setter`.
    ///
    /// When both sides fail, the pipeline's error is reported.
    pub fn ap_s<S2, T, Set>(
        self,
        setter: Set,
        fa: ReaderReaderIOResult<R, T>,
    ) -> ReaderReaderIOResult<R, S2>
    where
        S2: Send + 'static,
        T: Send + 'static,
        Set: Fn(S1, T) -> S2 + Send + Sync + 'static,
    {
        let setter = Arc::new(setter);
        ReaderReaderIOResult::new(move |env: R, ctx: Context| {
            let left = self.run(env.clone(), ctx.clone());
            let right = fa.run(env, ctx);
            let setter = setter.clone();
            async move {
                let (s1, t) = future::join(left, right).await;
                Ok(setter(s1?, t?))
            }
        })
    }

    /// [`bind`](Self::bind) through a lens: run an effect on the focused
    /// field and write its value back.
    pub fn bind_l<T, F>(self, lens: Lens<S1, T>, f: F) -> Self
    where
        T: Send + 'static,
        F: Fn(T) -> ReaderReaderIOResult<R, T> + Send + Sync + 'static,
    {
        let getter = lens.clone();
        self.bind(move |s, t| lens.set(s, t), move |s| f(getter.get(s)))
    }

    /// [`let_`](Self::let_) through a lens: replace the focused field with a
    /// pure function of its current value.
    pub fn let_l<T, F>(self, lens: Lens<S1, T>, f: F) -> Self
    where
        T: 'static,
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.map(move |s| lens.modify(s, &f))
    }

    /// [`let_to`](Self::let_to) through a lens: overwrite the focused field.
    pub fn let_to_l<T>(self, lens: Lens<S1, T>, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.map(move |s| lens.set(s, value.clone()))
    }

    /// [`ap_s`](Self::ap_s) through a lens: run an independent effect
    /// concurrently and store its value in the focused field.
    pub fn ap_s_l<T>(self, lens: Lens<S1, T>, fa: ReaderReaderIOResult<R, T>) -> Self
    where
        T: Send + 'static,
    {
        self.ap_s(move |s, t| lens.set(s, t), fa)
    }
}
