//! Cancellation contexts.
//!
//! A [`Context`] is the inner, per-call dependency of every
//! [`ReaderReaderIOResult`](crate::ReaderReaderIOResult). The combinators in
//! this crate never create one on their own behalf: the caller supplies it at
//! the execution boundary and it is forwarded unchanged through every layer.
//!
//! Cancellation is cooperative. Leaf constructors such as
//! [`from_io`](crate::effect::from_io) check [`Context::err`] before starting
//! and race their future against [`Context::done`], so an awaiting leaf stops
//! at its next suspension point once the context is done.
//!
//! # Example
//!
//! ```
//! use undertow::Context;
//!
//! # tokio_test::block_on(async {
//! let root = Context::background();
//! let (child, cancel) = root.with_cancel();
//!
//! assert!(!child.is_done());
//! cancel.cancel();
//! assert!(child.is_done());
//! assert!(child.err().unwrap().is_cancellation());
//!
//! // Cancelling a child never affects its parent.
//! assert!(!root.is_done());
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{Cancelled, Error, Result};

struct Node {
    parent: Option<Context>,
    deadline: Option<Instant>,
    // `None` for nodes that can only become done through a parent or deadline.
    state: Option<watch::Sender<Option<Cancelled>>>,
}

/// A cancellation token with an optional deadline.
///
/// Cloning is cheap; clones observe the same cancellation state.
#[derive(Clone)]
pub struct Context {
    node: Arc<Node>,
}

/// Cancels the context returned alongside it.
///
/// Dropping the handle does not cancel.
#[derive(Clone)]
pub struct CancelHandle {
    node: Arc<Node>,
}

impl Context {
    /// A context that is never done.
    pub fn background() -> Self {
        Context {
            node: Arc::new(Node {
                parent: None,
                deadline: None,
                state: None,
            }),
        }
    }

    /// A context that shares nothing with this one's cancellation.
    ///
    /// Used for cleanup work that must run to completion even when the
    /// surrounding operation was cancelled.
    pub fn detached(&self) -> Self {
        Context::background()
    }

    fn child(&self, deadline: Option<Instant>) -> (Context, CancelHandle) {
        let (state, _) = watch::channel(None);
        let node = Arc::new(Node {
            parent: Some(self.clone()),
            deadline,
            state: Some(state),
        });
        (
            Context { node: node.clone() },
            CancelHandle { node },
        )
    }

    /// Derive a child context that can be cancelled through the returned handle.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        self.child(None)
    }

    /// Derive a child context that is done once `deadline` has passed.
    ///
    /// The effective deadline is the earliest one in the chain of parents.
    pub fn with_deadline(&self, deadline: Instant) -> (Context, CancelHandle) {
        self.child(Some(deadline))
    }

    /// Derive a child context that is done after `timeout` has elapsed.
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelHandle) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The earliest deadline of this context and its parents.
    pub fn deadline(&self) -> Option<Instant> {
        let own = self.node.deadline;
        let inherited = self.node.parent.as_ref().and_then(Context::deadline);
        match (own, inherited) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Why this context is done, or `None` if it is still live.
    pub fn cause(&self) -> Option<Cancelled> {
        let mut current = self;
        loop {
            if let Some(state) = &current.node.state {
                if let Some(cause) = *state.borrow() {
                    return Some(cause);
                }
            }
            if let Some(deadline) = current.node.deadline {
                if Instant::now() >= deadline {
                    return Some(Cancelled::DeadlineExceeded);
                }
            }
            match &current.node.parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// The cancellation error for this context, or `None` if it is still live.
    pub fn err(&self) -> Option<Error> {
        self.cause().map(Error::from_cancelled)
    }

    /// Returns true once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.cause().is_some()
    }

    /// Wait until the context is done and return the cause.
    ///
    /// Never resolves for a context that cannot be cancelled.
    pub async fn done(&self) -> Cancelled {
        let mut waits: Vec<BoxFuture<'static, ()>> = Vec::new();
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some(state) = &ctx.node.state {
                let mut rx = state.subscribe();
                waits.push(
                    async move {
                        let _ = rx.wait_for(Option::is_some).await;
                    }
                    .boxed(),
                );
            }
            current = ctx.node.parent.as_ref();
        }
        if let Some(deadline) = self.deadline() {
            waits.push(tokio::time::sleep_until(deadline).boxed());
        }

        if waits.is_empty() {
            future::pending::<()>().await;
        }
        future::select_all(waits).await;
        self.cause().unwrap_or(Cancelled::Cancelled)
    }

    /// Run `fut` unless the context is already done, abandoning it if the
    /// context becomes done first.
    ///
    /// This is the guard every effectful leaf in the crate goes through.
    pub async fn guard<A, Fut>(&self, fut: Fut) -> Result<A>
    where
        Fut: Future<Output = Result<A>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            result = fut => result,
            cause = self.done() => Err(Error::from_cancelled(cause)),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.deadline())
            .field("cause", &self.cause())
            .finish()
    }
}

impl CancelHandle {
    /// Cancel the associated context and all of its descendants.
    ///
    /// Cancelling more than once has no further effect.
    pub fn cancel(&self) {
        if let Some(state) = &self.node.state {
            state.send_if_modified(|current| {
                if current.is_none() {
                    *current = Some(Cancelled::Cancelled);
                    true
                } else {
                    false
                }
            });
        }
    }

    /// Returns true if [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.node
            .state
            .as_ref()
            .is_some_and(|state| state.borrow().is_some())
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
