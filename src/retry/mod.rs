//! Retry policies.
//!
//! A [`RetryPolicy`] is pure: given a [`RetryStatus`] it answers whether to
//! retry and how long to wait. Running the retries is the job of
//! [`retrying`](crate::effect::retrying), which feeds the status of each
//! attempt to the action and the policy.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use undertow::effect::{from_async, retrying};
//! use undertow::{Context, Error, RetryPolicy};
//!
//! # tokio_test::block_on(async {
//! let policy = RetryPolicy::exponential_backoff(Duration::from_millis(1))
//!     .with_max_retries(3);
//!
//! let flaky = retrying(
//!     policy,
//!     |status| {
//!         let iteration = status.iteration;
//!         from_async(move |_: (), _: Context| async move {
//!             if iteration < 2 {
//!                 Err(Error::msg("transient"))
//!             } else {
//!                 Ok(iteration)
//!             }
//!         })
//!     },
//!     |result| result.is_err(),
//! );
//!
//! assert_eq!(flaky.run((), Context::background()).await, Ok(2));
//! # });
//! ```
//!
//! # Retry Strategies
//!
//! - **Constant**: Fixed delay between retries
//! - **Linear**: Delay increases linearly (100ms, 200ms, 300ms, ...)
//! - **Exponential**: Delay doubles each retry (100ms, 200ms, 400ms, ...)
//! - **Fibonacci**: Delay follows Fibonacci sequence
//!
//! Bound them with [`RetryPolicy::limit_retries`],
//! [`RetryPolicy::limit_retries_by_delay`] or
//! [`RetryPolicy::limit_retries_by_cumulative_delay`], and cap individual
//! delays with [`RetryPolicy::capped`].
//!
//! # Jitter Support
//!
//! Jitter adds randomness to delays to prevent thundering herd problems.
//! Enable the `jitter` feature to use jitter:
//!
//! ```toml
//! undertow = { version = "...", features = ["jitter"] }
//! ```
//!
//! ```rust,ignore
//! use undertow::retry::JitterStrategy;
//! use undertow::RetryPolicy;
//! use std::time::Duration;
//!
//! // Add ±25% randomness to delays
//! let policy = RetryPolicy::exponential_backoff(Duration::from_millis(100))
//!     .with_jitter(JitterStrategy::Proportional(0.25))
//!     .with_max_retries(5);
//! ```

mod policy;
mod status;

pub use policy::{JitterStrategy, RetryPolicy};
pub use status::RetryStatus;
