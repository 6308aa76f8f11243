//! Bracket pattern for safe resource management.
//!
//! - [`bracket`] acquires a resource, uses it and always releases it
//! - [`bracket_with`] does the same with an explicit [`ReleasePolicy`]
//! - [`with_resource`] packages acquire and release into a reusable [`Resource`]
//!
//! Release runs on a [detached](crate::Context::detached) context, so cleanup
//! still happens when the surrounding context was cancelled during use. Once
//! a resource is acquired, its release also survives the bracket itself being
//! dropped, as happens under [`with_timeout`](crate::ReaderReaderIOResult::with_timeout):
//! the release is then finished on a spawned task.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use undertow::effect::{bracket, from_io, of};
//! use undertow::{Context, IO};
//!
//! # tokio_test::block_on(async {
//! let closed = Arc::new(AtomicBool::new(false));
//! let flag = closed.clone();
//!
//! let length = bracket(
//!     of::<(), _>("handle".to_string()),
//!     |handle| of(handle.len()),
//!     move |_handle, _outcome| {
//!         let flag = flag.clone();
//!         from_io(IO::from_fn(move || flag.store(true, Ordering::SeqCst)))
//!     },
//! );
//!
//! assert_eq!(length.run((), Context::background()).await, Ok(6));
//! assert!(closed.load(Ordering::SeqCst));
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::runtime::Handle;

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;
use crate::error::{Error, Result};

/// How a release failure combines with the outcome of the use step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleasePolicy {
    /// Return the use outcome unchanged; a release failure is only logged.
    #[default]
    PreferUse,
    /// Fail with the release error when the use step succeeded. A use
    /// failure still wins over a release failure.
    Surface,
}

/// Acquire a resource, use it, and release it whatever the use outcome.
///
/// `release` receives the resource and the outcome of `use_fn`, and is
/// invoked exactly once for every successful acquisition. If acquisition
/// fails, neither `use_fn` nor `release` runs. A failing release is logged
/// with `tracing::warn!` and does not replace the use outcome; see
/// [`bracket_with`] to change that.
pub fn bracket<R, Res, B, X, U, Rel>(
    acquire: ReaderReaderIOResult<R, Res>,
    use_fn: U,
    release: Rel,
) -> ReaderReaderIOResult<R, B>
where
    R: Clone + Send + Sync + 'static,
    Res: Send + 'static,
    B: Send + 'static,
    X: Send + 'static,
    U: Fn(&Res) -> ReaderReaderIOResult<R, B> + Send + Sync + 'static,
    Rel: Fn(Res, &Result<B>) -> ReaderReaderIOResult<R, X> + Send + Sync + 'static,
{
    bracket_with(ReleasePolicy::PreferUse, acquire, use_fn, release)
}

/// [`bracket`] with an explicit [`ReleasePolicy`].
pub fn bracket_with<R, Res, B, X, U, Rel>(
    policy: ReleasePolicy,
    acquire: ReaderReaderIOResult<R, Res>,
    use_fn: U,
    release: Rel,
) -> ReaderReaderIOResult<R, B>
where
    R: Clone + Send + Sync + 'static,
    Res: Send + 'static,
    B: Send + 'static,
    X: Send + 'static,
    U: Fn(&Res) -> ReaderReaderIOResult<R, B> + Send + Sync + 'static,
    Rel: Fn(Res, &Result<B>) -> ReaderReaderIOResult<R, X> + Send + Sync + 'static,
{
    let use_fn = Arc::new(use_fn);
    let release = Arc::new(release);
    ReaderReaderIOResult::new(move |env: R, ctx: Context| {
        let acquired = acquire.run(env.clone(), ctx.clone());
        let use_fn = use_fn.clone();
        let release = release.clone();
        async move {
            let resource = acquired.await?;
            let using = use_fn(&resource).run(env.clone(), ctx.clone());
            let mut pending = PendingRelease::new(resource, &ctx, {
                let detached = ctx.detached();
                move |res, outcome: &Result<B>| {
                    release(res, outcome)
                        .map(|_| ())
                        .run(env.clone(), detached.clone())
                }
            });
            let outcome = using.await;
            let released = pending.finish(&outcome).await;
            settle(policy, outcome, released)
        }
    })
}

type ReleaseRun<Res, B> = dyn Fn(Res, &Result<B>) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// An acquired resource whose release has not started yet.
///
/// Dropping it while still holding the resource releases it on a spawned
/// task, with the context's cancellation as the use outcome.
struct PendingRelease<Res, B> {
    resource: Option<Res>,
    ctx: Context,
    release: Box<ReleaseRun<Res, B>>,
}

impl<Res, B> PendingRelease<Res, B>
where
    Res: Send + 'static,
    B: 'static,
{
    fn new<F>(resource: Res, ctx: &Context, release: F) -> Self
    where
        F: Fn(Res, &Result<B>) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        PendingRelease {
            resource: Some(resource),
            ctx: ctx.clone(),
            release: Box::new(release),
        }
    }

    /// Release with the real outcome of the use step.
    ///
    /// The release runs on its own task, so dropping the returned future
    /// does not stop it half-way.
    fn finish(&mut self, outcome: &Result<B>) -> BoxFuture<'static, Result<()>> {
        let Some(resource) = self.resource.take() else {
            return async { Ok(()) }.boxed();
        };
        let releasing = (self.release)(resource, outcome);
        match Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn(releasing);
                async move { task.await.unwrap_or_else(|e| Err(Error::new(e))) }.boxed()
            }
            Err(_) => releasing,
        }
    }

    /// Take the resource back without releasing it.
    fn disarm(mut self) -> Option<Res> {
        self.resource.take()
    }
}

impl<Res, B> Drop for PendingRelease<Res, B> {
    fn drop(&mut self) {
        let Some(resource) = self.resource.take() else {
            return;
        };
        let cause = self.ctx.err().unwrap_or_else(Error::cancelled);
        let releasing = (self.release)(resource, &Err(cause));
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(rel_err) = releasing.await {
                        tracing::warn!(error = %rel_err, "resource release failed");
                    }
                });
            }
            Err(_) => tracing::warn!("resource dropped outside a tokio runtime, release skipped"),
        }
    }
}

fn settle<B, X>(policy: ReleasePolicy, outcome: Result<B>, released: Result<X>) -> Result<B> {
    let Err(rel_err) = released else {
        return outcome;
    };
    match (policy, outcome) {
        (ReleasePolicy::Surface, Ok(_)) => Err(rel_err.context("releasing resource")),
        (_, outcome) => {
            tracing::warn!(error = %rel_err, "resource release failed");
            outcome
        }
    }
}

type ReleaseFn<R, Res> = dyn Fn(Res) -> ReaderReaderIOResult<R, ()> + Send + Sync;

/// A reusable pairing of acquisition and release.
///
/// Created by [`with_resource`]. Each call to [`with`](Resource::with) builds
/// a bracketed computation; every run of it acquires a fresh resource.
pub struct Resource<R, Res> {
    create: ReaderReaderIOResult<R, Res>,
    release: Arc<ReleaseFn<R, Res>>,
}

impl<R, Res> Clone for Resource<R, Res> {
    fn clone(&self) -> Self {
        Resource {
            create: self.create.clone(),
            release: self.release.clone(),
        }
    }
}

impl<R, Res> fmt::Debug for Resource<R, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("release", &"<function>")
            .finish_non_exhaustive()
    }
}

/// Package how to create and release a resource for later use.
///
/// ```
/// use undertow::effect::{of, with_resource};
/// use undertow::Context;
///
/// # tokio_test::block_on(async {
/// let numbers = with_resource(of::<(), _>(vec![1, 2, 3]), |_| of(()));
///
/// let sum = numbers.with(|v| of(v.iter().sum::<i32>()));
/// let len = numbers.with(|v| of(v.len()));
///
/// assert_eq!(sum.run((), Context::background()).await, Ok(6));
/// assert_eq!(len.run((), Context::background()).await, Ok(3));
/// # });
/// ```
pub fn with_resource<R, Res, X, Rel>(
    create: ReaderReaderIOResult<R, Res>,
    release: Rel,
) -> Resource<R, Res>
where
    R: Clone + Send + Sync + 'static,
    Res: Send + 'static,
    X: Send + 'static,
    Rel: Fn(Res) -> ReaderReaderIOResult<R, X> + Send + Sync + 'static,
{
    Resource {
        create,
        release: Arc::new(move |res| release(res).map(|_| ())),
    }
}

impl<R, Res> Resource<R, Res>
where
    R: Clone + Send + Sync + 'static,
    Res: Send + 'static,
{
    /// Use the resource, releasing it afterwards.
    pub fn with<B, U>(&self, use_fn: U) -> ReaderReaderIOResult<R, B>
    where
        B: Send + 'static,
        U: Fn(&Res) -> ReaderReaderIOResult<R, B> + Send + Sync + 'static,
    {
        let release = self.release.clone();
        bracket(self.create.clone(), use_fn, move |res, _: &Result<B>| {
            release(res)
        })
    }

    /// Combine with another resource.
    ///
    /// `other` is acquired after this one and released before it. If `other`
    /// fails to acquire, this resource is released before the error is
    /// returned.
    pub fn both<Res2>(self, other: Resource<R, Res2>) -> Resource<R, (Res, Res2)>
    where
        Res2: Send + 'static,
    {
        let first_release = self.release.clone();
        let second_release = other.release.clone();

        let create = ReaderReaderIOResult::new({
            let first = self.create;
            let second = other.create;
            let first_release = first_release.clone();
            move |env: R, ctx: Context| {
                let acquire_first = first.run(env.clone(), ctx.clone());
                let second = second.clone();
                let first_release = first_release.clone();
                async move {
                    let a = acquire_first.await?;
                    let acquire_second = second.run(env.clone(), ctx.clone());
                    let mut pending = PendingRelease::new(a, &ctx, {
                        let detached = ctx.detached();
                        move |res, _: &Result<()>| {
                            first_release(res).run(env.clone(), detached.clone())
                        }
                    });
                    match acquire_second.await {
                        Ok(b) => pending
                            .disarm()
                            .map(|a| (a, b))
                            .ok_or_else(Error::cancelled),
                        Err(err) => {
                            if let Err(rel_err) = pending.finish(&Ok(())).await {
                                tracing::warn!(error = %rel_err, "resource release failed");
                            }
                            Err(err)
                        }
                    }
                }
            }
        });

        let release = move |(a, b): (Res, Res2)| {
            let release_second = second_release(b);
            let release_first = first_release(a);
            ReaderReaderIOResult::new(move |env: R, ctx: Context| {
                let release_second = release_second.clone();
                let release_first = release_first.clone();
                async move {
                    let second = release_second.run(env.clone(), ctx.clone()).await;
                    let first = release_first.run(env, ctx).await;
                    second.and(first)
                }
            })
        };

        Resource {
            create,
            release: Arc::new(release),
        }
    }
}
