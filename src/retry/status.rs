use std::time::Duration;

use crate::retry::policy::RetryPolicy;

/// Where a retry loop stands.
///
/// The status starts at [`RetryStatus::default`] before the first attempt
/// and is advanced with [`apply_policy`](RetryStatus::apply_policy) after
/// each failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryStatus {
    /// Number of retries performed so far.
    pub iteration: u32,
    /// Total time waited between attempts so far.
    pub cumulative_delay: Duration,
    /// The most recent delay, `None` before the first retry.
    pub previous_delay: Option<Duration>,
}

impl RetryStatus {
    /// Ask `policy` whether to retry, and if so return the advanced status.
    ///
    /// ```rust
    /// use undertow::{RetryPolicy, RetryStatus};
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::constant_delay(Duration::from_millis(10))
    ///     .with_max_retries(1);
    ///
    /// let first = RetryStatus::default().apply_policy(&policy).unwrap();
    /// assert_eq!(first.iteration, 1);
    /// assert_eq!(first.previous_delay, Some(Duration::from_millis(10)));
    ///
    /// assert!(first.apply_policy(&policy).is_none());
    /// ```
    pub fn apply_policy(&self, policy: &RetryPolicy) -> Option<RetryStatus> {
        let delay = policy.delay(self)?;
        Some(RetryStatus {
            iteration: self.iteration.saturating_add(1),
            cumulative_delay: self.cumulative_delay.saturating_add(delay),
            previous_delay: Some(delay),
        })
    }
}
