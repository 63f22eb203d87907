use crate::clock::{Clock, MonotonicClock};
use crate::error::RetryRequested;
use std::time::Duration;

/// A failed attempt of an operation run by a [`TimeBoundAttempter`].
///
/// `attempt` counts from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FailedAttempt {
    pub attempt: usize,
}

/// Runs an operation on the current thread, retrying it for as long as it
/// asks for a retry and the maximum duration has not passed.
///
/// After each failed attempt still within the duration, `on_attempt_failed`
/// runs (typically a delay) and the operation is tried again. Once the
/// duration has passed, `on_all_failed` produces the result instead.
///
/// ```
/// use std::cell::Cell;
/// use std::time::Duration;
/// use wrapped_sync::{FailedAttempt, RetryRequested, TimeBoundAttempter};
///
/// let attempter = TimeBoundAttempter::new(
///     Duration::from_secs(1),
///     |_failed: FailedAttempt| {},
///     |_failed: FailedAttempt| -1,
/// );
///
/// let calls = Cell::new(0);
/// let result = attempter.perform(|| {
///     calls.set(calls.get() + 1);
///     if calls.get() < 3 { Err(RetryRequested) } else { Ok(calls.get()) }
/// });
/// assert_eq!(result, 3);
/// ```
///
/// 在当前线程上运行操作，只要操作请求重试且未超过最长时间就重试。
/// 每次失败且仍在时限内时，运行 `on_attempt_failed`（通常是延迟），然后再次
/// 尝试。一旦超过时限，改由 `on_all_failed` 产生结果。
pub struct TimeBoundAttempter<A, Z, C = MonotonicClock> {
    max_duration: Duration,
    clock: C,
    on_attempt_failed: A,
    on_all_failed: Z,
}

impl<A, Z> TimeBoundAttempter<A, Z>
where
    A: Fn(FailedAttempt),
{
    pub fn new(max_duration: Duration, on_attempt_failed: A, on_all_failed: Z) -> Self {
        Self::with_clock(max_duration, MonotonicClock, on_attempt_failed, on_all_failed)
    }
}

impl<A, Z, C> TimeBoundAttempter<A, Z, C>
where
    A: Fn(FailedAttempt),
    C: Clock,
{
    pub fn with_clock(
        max_duration: Duration,
        clock: C,
        on_attempt_failed: A,
        on_all_failed: Z,
    ) -> Self {
        Self {
            max_duration,
            clock,
            on_attempt_failed,
            on_all_failed,
        }
    }

    #[inline]
    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Run `operation` until it succeeds or the maximum duration has passed.
    ///
    /// 运行 `operation` 直到成功或超过最长时间。
    pub fn perform<T, F>(&self, mut operation: F) -> T
    where
        F: FnMut() -> Result<T, RetryRequested>,
        Z: Fn(FailedAttempt) -> T,
    {
        let start = self.clock.now();
        let mut attempt = 1;

        loop {
            match operation() {
                Ok(value) => return value,
                Err(RetryRequested) => {
                    let failed = FailedAttempt { attempt };
                    if self.clock.now().saturating_duration_since(start) <= self.max_duration {
                        tracing::debug!(attempt, "operation requested a retry");
                        (self.on_attempt_failed)(failed);
                    } else {
                        tracing::warn!(
                            attempts = attempt,
                            max_duration = ?self.max_duration,
                            "operation still failing after max duration, giving up"
                        );
                        return (self.on_all_failed)(failed);
                    }
                }
            }
            attempt += 1;
        }
    }
}
