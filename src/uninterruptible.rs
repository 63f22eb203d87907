use crate::sync::{Condvar, MutexGuard};
use std::time::{Duration, Instant};

/// Absolute deadline for a bounded wait, or `None` for an unbounded one.
///
/// A timeout too large to be represented as an `Instant` is treated as
/// unbounded.
///
/// 有界等待的绝对截止时间，`None` 表示无界等待。
/// 无法表示为 `Instant` 的超大超时被视为无界。
#[inline]
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Wait on `condvar` while `blocked` holds for the guarded state.
///
/// Wake-ups that leave the state blocked (spurious or not) re-arm the wait
/// against the same absolute `deadline`; the budget is never re-extended.
/// The predicate is always checked before the deadline, so a zero budget
/// still succeeds when the state is already unblocked.
///
/// Returns the guard together with `true` if the state became unblocked,
/// or `false` if the deadline passed first.
///
/// 当 `blocked` 对受保护状态成立时在 `condvar` 上等待。
///
/// 任何未解除阻塞的唤醒（无论是否为虚假唤醒）都会以同一个绝对截止时间
/// 重新等待，预算不会被延长。谓词总在截止时间之前检查，所以当状态已经
/// 解除阻塞时，零预算依然成功。
///
/// 返回守卫以及一个标志：状态解除阻塞时为 `true`，先到截止时间时为 `false`。
pub(crate) fn wait_until<'a, T, F>(
    condvar: &Condvar,
    mut guard: MutexGuard<'a, T>,
    deadline: Option<Instant>,
    mut blocked: F,
) -> (MutexGuard<'a, T>, bool)
where
    F: FnMut(&mut T) -> bool,
{
    while blocked(&mut *guard) {
        match deadline {
            None => guard = condvar.wait(guard),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return (guard, false);
                }
                guard = condvar.wait_for(guard, deadline - now);
            }
        }
    }

    (guard, true)
}
