/// 基础测试模块
/// 测试 WrappedLock 与 WrappedReadWriteLock 的获取、释放与超时

use super::doubles::CountingLock;
use crate::{AcquireTimeout, RawLock, SimpleLock, WrappedLock, WrappedReadWriteLock};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

/// 测试1: in_lock 返回操作的结果并恰好释放一次
#[test]
fn test_in_lock_returns_result_and_releases() {
    let lock = WrappedLock::with_lock(CountingLock::granting());

    let result = lock.in_lock(|| {
        // 操作运行时锁已获取且尚未释放
        assert_eq!(lock.delegate().locks.get(), 1);
        assert_eq!(lock.delegate().unlocks.get(), 0);
        "result"
    });

    assert_eq!(result, "result");
    assert_eq!(lock.delegate().unlocks.get(), 1);
}

/// 测试2: 操作返回的错误原样传播
#[test]
fn test_in_lock_propagates_error() {
    let lock = WrappedLock::with_lock(CountingLock::granting());

    let result: Result<(), &str> = lock.in_lock(|| Err("test"));

    assert_eq!(result, Err("test"));
    assert_eq!(lock.delegate().unlocks.get(), 1);
}

/// 测试3: 操作 panic 时锁依然被释放
#[test]
fn test_in_lock_releases_on_panic() {
    let lock = WrappedLock::with_lock(CountingLock::granting());

    let outcome = catch_unwind(AssertUnwindSafe(|| lock.in_lock(|| -> () { panic!("boom") })));

    assert!(outcome.is_err());
    assert_eq!(lock.delegate().locks.get(), 1);
    assert_eq!(lock.delegate().unlocks.get(), 1);
}

/// 测试4: 有界获取把超时原样交给委托锁
#[test]
fn test_in_lock_timeout_passes_timeout_through() {
    let lock = WrappedLock::with_lock(CountingLock::granting());
    let timeout = Duration::from_secs(123);

    let result = lock.in_lock_timeout(|| "result", timeout);

    assert_eq!(result, Ok("result"));
    assert_eq!(*lock.delegate().timed_locks.borrow(), vec![timeout]);
    assert_eq!(lock.delegate().locks.get(), 0);
    assert_eq!(lock.delegate().unlocks.get(), 1);
}

/// 测试5: 超时时不运行操作，也不释放
#[test]
fn test_in_lock_timeout_never_runs_work() {
    let lock = WrappedLock::with_lock(CountingLock::refusing());
    let mut invocations = 0;

    let result = lock.in_lock_timeout(|| invocations += 1, Duration::ZERO);

    assert_eq!(result, Err(AcquireTimeout));
    assert_eq!(invocations, 0);
    assert_eq!(lock.delegate().unlocks.get(), 0);
}

/// 测试6: SimpleLock 互斥且不可重入
#[test]
fn test_simple_lock_excludes() {
    let lock = SimpleLock::new();

    assert!(lock.try_lock());
    assert!(lock.is_locked());
    assert!(!lock.try_lock());
    assert!(!lock.try_lock_for(Duration::from_millis(10)));

    lock.unlock();
    assert!(!lock.is_locked());
    assert!(lock.try_lock_for(Duration::ZERO));
    lock.unlock();
}

/// 测试7: 默认 WrappedLock 在操作期间持有锁
#[test]
fn test_default_wrapped_lock_holds_during_work() {
    let lock = WrappedLock::new();

    let held = lock.in_lock(|| lock.delegate().is_locked());
    assert!(held);
    assert!(!lock.delegate().is_locked());

    // 持有期间的有界获取超时
    let nested = lock.in_lock(|| lock.in_lock_timeout(|| (), Duration::ZERO));
    assert_eq!(nested, Err(AcquireTimeout));
}

/// 测试8: 释放未持有的 SimpleLock 是程序错误
#[test]
#[should_panic(expected = "BUG")]
fn test_simple_lock_unlock_unheld_panics() {
    SimpleLock::new().unlock();
}

/// 测试9: 读写锁的两侧：读者共享，写者独占
#[test]
fn test_read_write_sides() {
    let lock = WrappedReadWriteLock::new();

    let readers = lock.read_lock().in_lock(|| {
        lock.read_lock()
            .in_lock_timeout(|| lock.delegate().read_lock_count(), Duration::ZERO)
    });
    assert_eq!(readers, Ok(2));

    let blocked = lock
        .read_lock()
        .in_lock(|| lock.write_lock().in_lock_timeout(|| (), Duration::ZERO));
    assert_eq!(blocked, Err(AcquireTimeout));

    let excluded = lock
        .write_lock()
        .in_lock(|| lock.read_lock().in_lock_timeout(|| (), Duration::ZERO));
    assert_eq!(excluded, Err(AcquireTimeout));

    assert!(!lock.delegate().is_read_locked());
    assert!(!lock.delegate().is_write_locked());
}

/// 测试10: 读写锁的一侧在 panic 时依然释放
#[test]
fn test_read_write_side_releases_on_panic() {
    let lock = WrappedReadWriteLock::new();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        lock.write_lock().in_lock(|| -> () { panic!("boom") })
    }));

    assert!(outcome.is_err());
    assert!(!lock.delegate().is_write_locked());
    assert_eq!(lock.write_lock().in_lock(|| 1), 1);
}
