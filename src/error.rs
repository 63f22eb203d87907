use thiserror::Error;

/// Returned by the bounded-timeout variants when the lock could not be
/// acquired within the given duration. The wrapped work is never run.
///
/// 当锁无法在给定时间内获取时，由带超时的变体返回。被包装的操作不会运行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Error)]
#[error("timed out acquiring lock")]
pub struct AcquireTimeout;

/// Returned by an operation handed to
/// [`TimeBoundAttempter`](crate::TimeBoundAttempter) to ask for another attempt.
///
/// 由交给 `TimeBoundAttempter` 的操作返回，请求再次尝试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Error)]
#[error("retry requested")]
pub struct RetryRequested;
