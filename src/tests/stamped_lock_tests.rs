/// StampedLock 测试模块
/// 测试真实戳记锁的模式互斥、乐观验证、转换与超时行为

use crate::{AcquireTimeout, RawReadWriteLock, RawStampedLock, StampedLock, WrappedStampedLock};
use std::thread;
use std::time::Duration;

/// 测试1: 乐观戳记在没有写者介入时验证通过
#[test]
fn test_optimistic_stamp_validates_without_writer() {
    let lock = StampedLock::new();

    let stamp = lock.try_optimistic_read().expect("lock is free");
    assert!(lock.validate(stamp));

    // 悲观读不会使乐观戳记失效
    let read = lock.read_lock();
    assert!(lock.validate(stamp));
    lock.unlock_read(read);
    assert!(lock.validate(stamp));
}

/// 测试2: 写获取使之前的乐观戳记失效，释放后依然失效
#[test]
fn test_write_invalidates_optimistic_stamp() {
    let lock = StampedLock::new();
    let stamp = lock.try_optimistic_read().expect("lock is free");

    let write = lock.write_lock();
    assert!(!lock.validate(stamp));
    lock.unlock_write(write);
    assert!(!lock.validate(stamp));

    // 写释放后获取的新乐观戳记有效
    let fresh = lock.try_optimistic_read().expect("lock is free");
    assert!(lock.validate(fresh));
}

/// 测试3: 写锁定期间无法获取乐观戳记
#[test]
fn test_no_optimistic_stamp_while_write_locked() {
    let lock = StampedLock::new();

    let write = lock.write_lock();
    assert!(lock.is_write_locked());
    assert_eq!(lock.try_optimistic_read(), None);

    lock.unlock_write(write);
    assert!(!lock.is_write_locked());
    assert!(lock.try_optimistic_read().is_some());
}

/// 测试4: 多个悲观读戳记可以共存，并阻止写者
#[test]
fn test_read_stamps_coexist_and_block_writer() {
    let lock = StampedLock::new();

    let first = lock.read_lock();
    let second = lock.try_read_lock().expect("readers share the lock");
    assert_eq!(lock.read_lock_count(), 2);
    assert_eq!(lock.try_write_lock(), None);

    lock.unlock_read(first);
    assert!(lock.is_read_locked());
    lock.unlock_read(second);
    assert!(!lock.is_read_locked());

    let write = lock.try_write_lock().expect("lock is free");
    lock.unlock_write(write);
}

/// 测试5: 写锁定期间读与写的尝试都失败
#[test]
fn test_write_excludes_readers_and_writers() {
    let lock = StampedLock::new();
    let write = lock.write_lock();

    assert_eq!(lock.try_read_lock(), None);
    assert_eq!(lock.try_write_lock(), None);
    assert_eq!(lock.try_read_lock_for(Duration::from_millis(10)), None);

    lock.unlock(write);
    assert!(lock.try_read_lock().is_some());
}

/// 测试6: 唯一读者的读戳记可以原地转换为写戳记
#[test]
fn test_convert_sole_read_stamp() {
    let lock = StampedLock::new();
    let optimistic = lock.try_optimistic_read().expect("lock is free");
    let read = lock.read_lock();

    let write = lock
        .try_convert_to_write_lock(read)
        .expect("sole reader converts");
    assert_ne!(write, read);
    assert!(lock.is_write_locked());
    assert_eq!(lock.read_lock_count(), 0);
    assert!(!lock.validate(optimistic));

    // 转换后的戳记通过通用释放归还
    lock.unlock(write);
    assert!(!lock.is_write_locked());
}

/// 测试7: 存在其他读者时转换失败，读戳记保持不变
#[test]
fn test_convert_fails_with_other_readers() {
    let lock = StampedLock::new();
    let first = lock.read_lock();
    let second = lock.read_lock();

    assert_eq!(lock.try_convert_to_write_lock(first), None);
    assert_eq!(lock.read_lock_count(), 2);

    lock.unlock_read(second);
    let write = lock
        .try_convert_to_write_lock(first)
        .expect("now the sole reader");
    lock.unlock_write(write);
}

/// 测试8: 乐观戳记仅在锁空闲且版本未变时可转换
#[test]
fn test_convert_optimistic_stamp() {
    let lock = StampedLock::new();

    let stale = lock.try_optimistic_read().expect("lock is free");
    let write = lock.write_lock();
    lock.unlock_write(write);
    assert_eq!(lock.try_convert_to_write_lock(stale), None);

    let fresh = lock.try_optimistic_read().expect("lock is free");
    let read = lock.read_lock();
    assert_eq!(lock.try_convert_to_write_lock(fresh), None);
    lock.unlock_read(read);

    let write = lock
        .try_convert_to_write_lock(fresh)
        .expect("free and unchanged");
    assert!(lock.is_write_locked());
    lock.unlock_write(write);
}

/// 测试9: 转换写戳记返回同一个戳记
#[test]
fn test_convert_write_stamp_is_identity() {
    let lock = StampedLock::new();
    let write = lock.write_lock();

    assert_eq!(lock.try_convert_to_write_lock(write), Some(write));
    lock.unlock_write(write);
}

/// 测试10: 读锁被持有时有界写获取超时，之后读者不受影响
#[test]
fn test_timed_write_times_out_and_readers_proceed() {
    let lock = StampedLock::new();
    let read = lock.read_lock();

    assert_eq!(lock.try_write_lock_for(Duration::from_millis(20)), None);

    // 超时的写者不再排队，新读者可以进入
    let another = lock.try_read_lock().expect("no writer is waiting");
    lock.unlock_read(another);
    lock.unlock_read(read);

    let write = lock.try_write_lock_for(Duration::ZERO).expect("lock is free");
    lock.unlock_write(write);
}

/// 测试11: 等待中的写者优先于新到达的读者
#[test]
fn test_waiting_writer_blocks_new_readers() {
    let lock = StampedLock::new();
    let read = lock.read_lock();

    thread::scope(|s| {
        let writer = s.spawn(|| {
            let write = lock.write_lock();
            lock.unlock_write(write);
        });

        // 写者开始等待后，新的读尝试会失败
        while let Some(sample) = lock.try_read_lock() {
            lock.unlock_read(sample);
            thread::yield_now();
        }

        lock.unlock_read(read);
        writer.join().unwrap();
    });

    assert!(!lock.is_write_locked());
    assert!(!lock.is_read_locked());
}

/// 测试12: 无戳记的读写视图
#[test]
fn test_mode_less_read_write_view() {
    let lock = StampedLock::new();

    lock.lock_shared();
    assert!(lock.is_read_locked());
    assert!(!lock.try_lock_exclusive_for(Duration::ZERO));
    lock.unlock_shared();

    lock.lock_exclusive();
    assert!(lock.is_write_locked());
    assert!(!lock.try_lock_shared_for(Duration::ZERO));
    lock.unlock_exclusive();
}

/// 测试13: 用错误模式的戳记释放是程序错误
#[test]
#[should_panic(expected = "BUG")]
fn test_unlock_read_with_write_stamp_panics() {
    let lock = StampedLock::new();
    let write = lock.write_lock();
    lock.unlock_read(write);
}

/// 测试14: 释放乐观戳记是程序错误
#[test]
#[should_panic(expected = "BUG")]
fn test_unlock_optimistic_stamp_panics() {
    let lock = StampedLock::new();
    let stamp = lock.try_optimistic_read().expect("lock is free");
    lock.unlock(stamp);
}

/// 测试15: 写锁被持有时零超时悲观读返回 AcquireTimeout，操作从未运行
#[test]
fn test_wrapped_zero_timeout_while_write_held() {
    let lock = WrappedStampedLock::new();
    let write = lock.delegate().write_lock();
    let mut invocations = 0;

    let result = lock.pessimistic_read_timeout(|| invocations += 1, Duration::ZERO);

    assert_eq!(result, Err(AcquireTimeout));
    assert_eq!(invocations, 0);
    lock.delegate().unlock_write(write);
}

/// 测试16: 锁空闲时零超时依然成功
#[test]
fn test_wrapped_zero_timeout_succeeds_when_free() {
    let lock = WrappedStampedLock::new();

    assert_eq!(lock.pessimistic_read_timeout(|| 1, Duration::ZERO), Ok(1));
    assert_eq!(lock.write_timeout(|| 2, Duration::ZERO), Ok(2));
    assert_eq!(lock.optimistic_read_timeout(|| 3, Duration::ZERO), Ok(3));
    assert!(!lock.delegate().is_read_locked());
    assert!(!lock.delegate().is_write_locked());
}

/// 测试17: 乐观读在写锁被持有时回退并超时
#[test]
fn test_wrapped_optimistic_read_times_out_behind_writer() {
    let lock = WrappedStampedLock::new();
    let write = lock.delegate().write_lock();

    let result = lock.optimistic_read_timeout(|| 1, Duration::from_millis(10));

    assert_eq!(result, Err(AcquireTimeout));
    lock.delegate().unlock_write(write);
}

/// 测试18: write_if 在真实锁上原地升级，之后锁完全释放
#[test]
fn test_wrapped_write_if_on_real_lock() {
    let lock = WrappedStampedLock::new();

    let passed = lock.write_if(
        || true,
        || lock.delegate().is_write_locked(),
        || false,
        crate::TestFailedLockContext::NoLock,
    );

    assert!(passed);
    assert!(!lock.delegate().is_write_locked());
    assert!(!lock.delegate().is_read_locked());
}

/// 测试19: 读写视图共用同一个委托锁
#[test]
fn test_wrapped_views_share_delegate() {
    let lock = WrappedStampedLock::new();

    let read_held = lock
        .as_read_lock()
        .in_lock(|| lock.write_timeout(|| (), Duration::ZERO));
    assert_eq!(read_held, Err(AcquireTimeout));

    let write_held = lock
        .as_write_lock()
        .in_lock(|| lock.delegate().is_write_locked());
    assert!(write_held);

    let via_rw = lock
        .as_read_write_lock()
        .read_lock()
        .in_lock(|| lock.delegate().read_lock_count());
    assert_eq!(via_rw, 1);
}

/// 测试20: 有界写者超时放弃时唤醒排在它后面的阻塞读者
#[test]
fn test_timed_out_writer_wakes_queued_readers() {
    let lock = StampedLock::new();
    let read = lock.read_lock();

    thread::scope(|s| {
        let writer = s.spawn(|| lock.try_write_lock_for(Duration::from_millis(200)));

        // 写者开始等待后，新的读尝试会失败
        while let Some(sample) = lock.try_read_lock() {
            lock.unlock_read(sample);
            thread::yield_now();
        }

        // 阻塞读者排在等待中的写者之后
        let reader = s.spawn(|| {
            let stamp = lock.read_lock();
            lock.unlock_read(stamp);
        });

        assert_eq!(writer.join().unwrap(), None);
        reader.join().unwrap();
    });

    lock.unlock_read(read);
    assert!(!lock.is_read_locked());
    assert!(!lock.is_write_locked());
}
