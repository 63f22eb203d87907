use std::time::{Duration, Instant};

/// Source of monotonic time points.
///
/// Only differences between two points are ever used, so implementations
/// must never go backwards. Closures returning an `Instant` are clocks too,
/// which is how tests script elapsed time.
///
/// 单调时间点的来源。
/// 只会使用两个时间点之间的差值，因此实现不能倒退。
/// 返回 `Instant` 的闭包也是时钟，测试通过它来编排流逝的时间。
pub trait Clock {
    fn now(&self) -> Instant;

    /// Time left of `budget` since `start`, clamped at zero.
    /// 从 `start` 起 `budget` 中剩余的时间，下限为零。
    #[inline]
    fn remaining(&self, start: Instant, budget: Duration) -> Duration {
        budget.saturating_sub(self.now().saturating_duration_since(start))
    }
}

/// The default clock, backed by [`Instant::now`].
/// 默认时钟，基于 [`Instant::now`]。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> Instant,
{
    #[inline]
    fn now(&self) -> Instant {
        self()
    }
}
