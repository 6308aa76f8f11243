//! Retrying computations under a [`RetryPolicy`].

use std::sync::Arc;

use crate::context::Context;
use crate::effect::ReaderReaderIOResult;
use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, RetryStatus};

/// Run `action` until it produces a result `check` does not want retried,
/// or until `policy` gives up.
///
/// `action` is called with the current [`RetryStatus`] and builds a fresh
/// computation for every attempt. `check` returns `true` for results that
/// should be retried. The result of the last attempt is returned either way.
///
/// Cancellation is never retried: if the context is done, or an attempt
/// fails with a cancellation error, the loop stops immediately. Waiting
/// between attempts is abandoned as soon as the context becomes done.
///
/// Each retry is logged at `debug` level, and running out of retries at
/// `warn` level.
pub fn retrying<R, A, Act, Chk>(
    policy: RetryPolicy,
    action: Act,
    check: Chk,
) -> ReaderReaderIOResult<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Send + 'static,
    Act: Fn(&RetryStatus) -> ReaderReaderIOResult<R, A> + Send + Sync + 'static,
    Chk: Fn(&Result<A>) -> bool + Send + Sync + 'static,
{
    let action = Arc::new(action);
    let check = Arc::new(check);
    ReaderReaderIOResult::new(move |env: R, ctx: Context| {
        let policy = policy.clone();
        let action = action.clone();
        let check = check.clone();
        async move {
            let mut status = RetryStatus::default();
            loop {
                if let Some(err) = ctx.err() {
                    return Err(err);
                }

                let attempt = action(&status).run(env.clone(), ctx.clone());
                let result = attempt.await;

                if matches!(&result, Err(e) if e.is_cancellation()) || !check(&result) {
                    return result;
                }

                let Some(next) = status.apply_policy(&policy) else {
                    tracing::warn!(
                        attempts = status.iteration + 1,
                        policy = ?policy,
                        "retries exhausted"
                    );
                    return result;
                };

                let delay = next.previous_delay.unwrap_or_default();
                if let Err(error) = &result {
                    tracing::debug!(attempt = next.iteration, ?delay, %error, "retrying");
                } else {
                    tracing::debug!(attempt = next.iteration, ?delay, "retrying");
                }

                tokio::select! {
                    biased;
                    cause = ctx.done() => return Err(Error::from_cancelled(cause)),
                    _ = tokio::time::sleep(delay) => {}
                }
                status = next;
            }
        }
    })
}
