//! # Undertow
//!
//! Layered effects for Rust: computations that read a long-lived
//! environment, honor a per-call cancellation context, defer their side
//! effects, and fail with a uniform error.
//!
//! ## The Layers
//!
//! The central type is [`ReaderReaderIOResult<R, A>`]. Peeling it one layer
//! at a time gives the narrower types it is built from:
//!
//! | Type | Shape |
//! |------|-------|
//! | [`ReaderReaderIOResult<R, A>`] | `R -> Context -> async () -> Result<A>` |
//! | [`ReaderIOResult<R, A>`] | `R -> async () -> Result<A>` |
//! | [`ReaderIO<R, A>`] | `R -> async () -> A` |
//! | [`Reader<R, A>`] | `R -> A` |
//! | [`IOResult<A>`] | `async () -> Result<A>` |
//! | [`IO<A>`] | `async () -> A` |
//!
//! The outer environment `R` holds what rarely changes (configuration,
//! pools, clients). The inner [`Context`] carries cancellation and deadlines
//! for a single call.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::time::Duration;
//! use undertow::prelude::*;
//!
//! #[derive(Clone)]
//! struct Env {
//!     base_url: String,
//! }
//!
//! fn fetch(path: &'static str) -> ReaderReaderIOResult<Env, String> {
//!     from_async(move |env: Env, _ctx: Context| async move {
//!         Ok(format!("{}/{}", env.base_url, path))
//!     })
//! }
//!
//! # tokio_test::block_on(async {
//! let page = fetch("users")
//!     .chain(|users| fetch("orders").map(move |orders| format!("{} + {}", users, orders)))
//!     .with_timeout(Duration::from_secs(1));
//!
//! let env = Env { base_url: "https://api".into() };
//! let result = page.run(env, Context::background()).await;
//! assert_eq!(result, Ok("https://api/users + https://api/orders".to_string()));
//! # });
//! ```
//!
//! ## Resource Safety
//!
//! [`bracket`](effect::bracket) releases what it acquired no matter how the
//! use step ends, including when the context is cancelled mid-way.
//!
//! ## Retries
//!
//! [`retrying`](effect::retrying) repeats a computation under a composable
//! [`RetryPolicy`] and never retries cancellation.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod context;
pub mod effect;
pub mod error;
pub mod io;
pub mod io_result;
pub mod optics;
pub mod reader;
pub mod reader_io;
pub mod reader_io_result;
pub mod retry;
pub mod testing;

// Re-exports
pub use context::{CancelHandle, Context};
pub use effect::ReaderReaderIOResult;
pub use error::{Cancelled, Error, Result};
pub use io::IO;
pub use io_result::IOResult;
pub use optics::Lens;
pub use reader::Reader;
pub use reader_io::ReaderIO;
pub use reader_io_result::ReaderIOResult;
pub use retry::{RetryPolicy, RetryStatus};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{CancelHandle, Context};
    pub use crate::effect::{
        ask, asks, bracket, do_, from_async, from_io, from_io_result, from_result, left, of,
        retrying, ReaderReaderIOResult,
    };
    pub use crate::error::{Error, Result};
    pub use crate::io::IO;
    pub use crate::io_result::IOResult;
    pub use crate::reader::Reader;
    pub use crate::reader_io::ReaderIO;
    pub use crate::reader_io_result::ReaderIOResult;
    pub use crate::retry::{RetryPolicy, RetryStatus};
}
