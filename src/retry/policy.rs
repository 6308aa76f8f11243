//! Retry policies.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::retry::status::RetryStatus;

type DelayFn = dyn Fn(&RetryStatus) -> Option<Duration> + Send + Sync;

/// Decides, from the status of the retries so far, whether to retry again
/// and how long to wait first.
///
/// A policy is a pure function: `None` means stop, `Some(delay)` means wait
/// `delay` and try again. Policies are cheap to clone and combine with
/// [`and`](RetryPolicy::and), where both sides must agree to retry and the
/// longer delay wins.
///
/// # Examples
///
/// ```rust
/// use undertow::{RetryPolicy, RetryStatus};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::exponential_backoff(Duration::from_millis(100))
///     .and(RetryPolicy::limit_retries(3));
///
/// let delays: Vec<_> = policy.delays().collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_millis(100),
///         Duration::from_millis(200),
///         Duration::from_millis(400),
///     ]
/// );
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    f: Arc<DelayFn>,
    label: Arc<str>,
}

impl RetryPolicy {
    /// Create a policy from a function of the retry status.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RetryStatus) -> Option<Duration> + Send + Sync + 'static,
    {
        RetryPolicy::labelled("custom", f)
    }

    fn labelled<F>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&RetryStatus) -> Option<Duration> + Send + Sync + 'static,
    {
        RetryPolicy {
            f: Arc::new(f),
            label: label.into(),
        }
    }

    /// Retry immediately, without limit.
    ///
    /// This is the identity of [`and`](Self::and).
    pub fn retry_forever() -> Self {
        RetryPolicy::labelled("retry_forever", |_| Some(Duration::ZERO))
    }

    /// Allow at most `n` retries, without delay.
    ///
    /// `limit_retries(3)` allows four attempts in total: the first one and
    /// three retries.
    ///
    /// ```rust
    /// use undertow::RetryPolicy;
    ///
    /// assert_eq!(RetryPolicy::limit_retries(3).delays().count(), 3);
    /// ```
    pub fn limit_retries(n: u32) -> Self {
        RetryPolicy::labelled(format!("limit_retries({})", n), move |status| {
            (status.iteration < n).then_some(Duration::ZERO)
        })
    }

    /// Wait the same `delay` before every retry.
    pub fn constant_delay(delay: Duration) -> Self {
        RetryPolicy::labelled(format!("constant_delay({:?})", delay), move |_| Some(delay))
    }

    /// Delay = base * (iteration + 1).
    ///
    /// ```rust
    /// use undertow::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::linear_backoff(Duration::from_millis(100));
    /// let delays: Vec<_> = policy.delays().take(3).collect();
    /// assert_eq!(
    ///     delays,
    ///     vec![
    ///         Duration::from_millis(100),
    ///         Duration::from_millis(200),
    ///         Duration::from_millis(300),
    ///     ]
    /// );
    /// ```
    pub fn linear_backoff(base: Duration) -> Self {
        RetryPolicy::labelled(format!("linear_backoff({:?})", base), move |status| {
            Some(base.saturating_mul(status.iteration.saturating_add(1)))
        })
    }

    /// Delay = base * 2^iteration.
    pub fn exponential_backoff(base: Duration) -> Self {
        RetryPolicy::labelled(format!("exponential_backoff({:?})", base), move |status| {
            Some(base.saturating_mul(2u32.saturating_pow(status.iteration)))
        })
    }

    /// Delay = base * fib(iteration + 1): 1, 1, 2, 3, 5, 8, ... times `base`.
    pub fn fibonacci_backoff(base: Duration) -> Self {
        RetryPolicy::labelled(format!("fibonacci_backoff({:?})", base), move |status| {
            Some(base.saturating_mul(fibonacci(status.iteration.saturating_add(1))))
        })
    }

    /// Retry only when both policies would, waiting the longer of the two delays.
    pub fn and(self, other: RetryPolicy) -> Self {
        let label = format!("{} and {}", self.label, other.label);
        RetryPolicy::labelled(label, move |status| {
            let a = self.delay(status)?;
            let b = other.delay(status)?;
            Some(a.max(b))
        })
    }

    /// Combine any number of policies with [`and`](Self::and).
    ///
    /// An empty collection gives [`retry_forever`](Self::retry_forever).
    pub fn all<I>(policies: I) -> Self
    where
        I: IntoIterator<Item = RetryPolicy>,
    {
        policies
            .into_iter()
            .reduce(RetryPolicy::and)
            .unwrap_or_else(RetryPolicy::retry_forever)
    }

    /// Shorthand for `self.and(RetryPolicy::limit_retries(n))`.
    pub fn with_max_retries(self, n: u32) -> Self {
        self.and(RetryPolicy::limit_retries(n))
    }

    /// Never wait longer than `max` between attempts.
    ///
    /// ```rust
    /// use undertow::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential_backoff(Duration::from_millis(100))
    ///     .capped(Duration::from_millis(300));
    /// let delays: Vec<_> = policy.delays().take(4).collect();
    /// assert_eq!(delays[2], Duration::from_millis(300));
    /// assert_eq!(delays[3], Duration::from_millis(300));
    /// ```
    pub fn capped(self, max: Duration) -> Self {
        let label = format!("{} capped at {:?}", self.label, max);
        RetryPolicy::labelled(label, move |status| self.delay(status).map(|d| d.min(max)))
    }

    /// Stop retrying once the delay this policy asks for exceeds `max`.
    pub fn limit_retries_by_delay(self, max: Duration) -> Self {
        let label = format!("{} while delay <= {:?}", self.label, max);
        RetryPolicy::labelled(label, move |status| {
            self.delay(status).filter(|d| *d <= max)
        })
    }

    /// Stop retrying once the total time spent waiting would exceed `max`.
    pub fn limit_retries_by_cumulative_delay(self, max: Duration) -> Self {
        let label = format!("{} while total delay <= {:?}", self.label, max);
        RetryPolicy::labelled(label, move |status| {
            self.delay(status)
                .filter(|d| status.cumulative_delay.saturating_add(*d) <= max)
        })
    }

    /// Randomize the delays of this policy.
    ///
    /// **Note**: Requires the `jitter` feature. Without it, delays are
    /// returned unchanged.
    pub fn with_jitter(self, jitter: JitterStrategy) -> Self {
        let label = format!("{} with {:?} jitter", self.label, jitter);
        RetryPolicy::labelled(label, move |status| {
            self.delay(status)
                .map(|d| jitter.apply(d, status.previous_delay))
        })
    }

    /// Ask the policy about the next retry.
    pub fn delay(&self, status: &RetryStatus) -> Option<Duration> {
        (self.f)(status)
    }

    /// The delays this policy produces for consecutive failures, assuming
    /// every retry fails.
    ///
    /// Infinite for policies without a limit.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(RetryStatus::default().apply_policy(self), move |status| {
            status.apply_policy(self)
        })
        .filter_map(|status| status.previous_delay)
    }
}

impl Default for RetryPolicy {
    /// Five retries with exponential backoff from 50ms.
    fn default() -> Self {
        RetryPolicy::exponential_backoff(Duration::from_millis(50)).with_max_retries(5)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetryPolicy").field(&self.label).finish()
    }
}

/// Strategy for adding randomness to delays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum JitterStrategy {
    /// No jitter applied.
    #[default]
    None,
    /// Add ±percentage randomness to delay.
    Proportional(f64),
    /// Random delay between 0 and calculated delay (AWS recommended).
    Full,
    /// Decorrelated jitter (AWS style): random between the calculated delay
    /// and three times the previous delay.
    Decorrelated,
}

impl JitterStrategy {
    /// Apply jitter to a base delay.
    ///
    /// # Arguments
    ///
    /// * `base_delay` - The calculated delay before jitter
    /// * `prev_delay` - The previous delay (for decorrelated jitter)
    pub fn apply(
        &self,
        base_delay: Duration,
        #[cfg_attr(not(feature = "jitter"), allow(unused_variables))] prev_delay: Option<Duration>,
    ) -> Duration {
        match self {
            JitterStrategy::None => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Proportional(factor) => {
                use rand::Rng;
                let factor = factor.clamp(0.0, 1.0);
                let base_millis = base_delay.as_millis() as f64;
                let jitter_range = base_millis * factor;
                let min = (base_millis - jitter_range).max(0.0);
                let max = base_millis + jitter_range;
                if max <= min {
                    return base_delay;
                }
                let jittered_millis = rand::rng().random_range(min..=max);
                Duration::from_millis(jittered_millis as u64)
            }
            #[cfg(feature = "jitter")]
            JitterStrategy::Full => {
                use rand::Rng;
                let max_millis = base_delay.as_millis() as u64;
                if max_millis == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::rng().random_range(0..=max_millis))
                }
            }
            #[cfg(feature = "jitter")]
            JitterStrategy::Decorrelated => {
                use rand::Rng;
                let prev = prev_delay.unwrap_or(base_delay);
                let base_millis = base_delay.as_millis() as u64;
                let max_millis = prev.as_millis().saturating_mul(3) as u64;
                if max_millis <= base_millis {
                    base_delay
                } else {
                    Duration::from_millis(rand::rng().random_range(base_millis..=max_millis))
                }
            }
            #[cfg(not(feature = "jitter"))]
            _ => base_delay,
        }
    }
}

/// Calculate the nth Fibonacci number.
fn fibonacci(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    let mut a = 0u32;
    let mut b = 1u32;
    for _ in 1..n {
        let temp = a.saturating_add(b);
        a = b;
        b = temp;
    }
    b
}
