//! The error type shared by every layer of the stack.
//!
//! Every computation in this crate fails with [`Error`]. It has three
//! possible sources:
//!
//! - a plain message ([`Error::msg`]) for domain failures built in place
//! - a wrapped `std::error::Error` ([`Error::new`]) when a typed error should
//!   stay reachable through [`Error::downcast_ref`]
//! - a cancellation cause ([`Error::cancelled`], [`Error::deadline_exceeded`])
//!   produced by a [`Context`](crate::Context) that is done
//!
//! Cancellation must be distinguishable from domain failure: retry loops never
//! retry it, and callers usually want to stop rather than recover.
//!
//! Errors accumulate a trail of breadcrumbs as they propagate outwards:
//!
//! ```
//! use undertow::Error;
//!
//! let err = Error::msg("connection refused")
//!     .context("connecting to database")
//!     .context("loading user profile");
//!
//! assert_eq!(err.context_trail(), &["connecting to database", "loading user profile"]);
//! assert_eq!(
//!     err.to_string(),
//!     "connection refused\n  -> connecting to database\n  -> loading user profile"
//! );
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Result of running any computation in this crate.
pub type Result<A> = std::result::Result<A, Error>;

/// Why a [`Context`](crate::Context) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cancelled {
    /// The context (or one of its parents) was cancelled explicitly.
    Cancelled,
    /// The context's deadline has passed.
    DeadlineExceeded,
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cancelled::Cancelled => write!(f, "context cancelled"),
            Cancelled::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl StdError for Cancelled {}

#[derive(Clone)]
enum Source {
    Cancelled(Cancelled),
    Message(Arc<str>),
    Wrapped(Arc<dyn StdError + Send + Sync + 'static>),
}

/// A cloneable error carrying a context trail.
///
/// Two errors are equal when they come from the same kind of source, render
/// the same root message and carry the same trail.
#[derive(Clone)]
pub struct Error {
    source: Source,
    context: Vec<String>,
}

impl Error {
    /// Create an error from a message.
    ///
    /// ```
    /// use undertow::Error;
    ///
    /// let err = Error::msg("boom");
    /// assert_eq!(err.to_string(), "boom");
    /// assert!(!err.is_cancellation());
    /// ```
    pub fn msg(message: impl fmt::Display) -> Self {
        Error {
            source: Source::Message(message.to_string().into()),
            context: Vec::new(),
        }
    }

    /// Wrap a typed error so it can be recovered with [`Error::downcast_ref`].
    ///
    /// ```
    /// use undertow::Error;
    ///
    /// let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    /// let err = Error::new(io);
    /// let inner = err.downcast_ref::<std::io::Error>().unwrap();
    /// assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
    /// ```
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            source: Source::Wrapped(Arc::new(error)),
            context: Vec::new(),
        }
    }

    /// The error reported by a context that was cancelled.
    pub fn cancelled() -> Self {
        Self::from_cancelled(Cancelled::Cancelled)
    }

    /// The error reported by a context whose deadline has passed.
    pub fn deadline_exceeded() -> Self {
        Self::from_cancelled(Cancelled::DeadlineExceeded)
    }

    /// Build the error for a specific cancellation cause.
    pub fn from_cancelled(cause: Cancelled) -> Self {
        Error {
            source: Source::Cancelled(cause),
            context: Vec::new(),
        }
    }

    /// Returns true if this error was caused by cancellation or a deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.source, Source::Cancelled(_))
    }

    /// The cancellation cause, if this is a cancellation error.
    pub fn cancellation(&self) -> Option<Cancelled> {
        match self.source {
            Source::Cancelled(cause) => Some(cause),
            _ => None,
        }
    }

    /// Append a context layer.
    ///
    /// Layers are recorded from the innermost operation outwards.
    pub fn context(mut self, msg: impl Into<String>) -> Self {
        self.context.push(msg.into());
        self
    }

    /// The context messages in the order they were added.
    pub fn context_trail(&self) -> &[String] {
        &self.context
    }

    /// Reach the wrapped typed error, if there is one of type `T`.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        match &self.source {
            Source::Wrapped(inner) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Render only the root cause, without the context trail.
    pub fn root_message(&self) -> String {
        match &self.source {
            Source::Cancelled(cause) => cause.to_string(),
            Source::Message(message) => message.to_string(),
            Source::Wrapped(inner) => inner.to_string(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.source {
            Source::Cancelled(_) => "Cancelled",
            Source::Message(_) => "Message",
            Source::Wrapped(_) => "Wrapped",
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind_name())
            .field("message", &self.root_message())
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root_message())?;
        for ctx in &self.context {
            write!(f, "\n  -> {}", ctx)?;
        }
        Ok(())
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        let same_source = match (&self.source, &other.source) {
            (Source::Cancelled(a), Source::Cancelled(b)) => a == b,
            (Source::Message(a), Source::Message(b)) => a == b,
            (Source::Wrapped(a), Source::Wrapped(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            _ => false,
        };
        same_source && self.context == other.context
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.source {
            Source::Cancelled(cause) => Some(cause),
            Source::Message(_) => None,
            Source::Wrapped(inner) => Some(&**inner),
        }
    }
}

impl From<Cancelled> for Error {
    fn from(cause: Cancelled) -> Self {
        Error::from_cancelled(cause)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(error)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::msg(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::msg(message)
    }
}
