//! Raw lock traits the wrappers are generic over.
//!
//! The wrappers never hold a guard object from the delegate. They call the
//! raw acquire and release methods directly, which is what lets a scripted
//! test double stand in for a real lock.
//!
//! 包装器所依赖的原始锁 trait。
//! 包装器从不持有委托锁的守卫对象，而是直接调用原始的获取与释放方法，
//! 因此可以用编排好的测试替身代替真实的锁。

use std::time::Duration;

/// A mutual-exclusion lock.
/// 互斥锁。
pub trait RawLock {
    /// Block until the lock is held by the caller.
    fn lock(&self);

    /// Try to acquire the lock for at most `timeout`. Returns `true` if the
    /// lock is now held by the caller.
    fn try_lock_for(&self, timeout: Duration) -> bool;

    /// Release a lock previously acquired by `lock` or a successful
    /// `try_lock_for`.
    fn unlock(&self);
}

/// A reader/writer lock.
/// 读写锁。
pub trait RawReadWriteLock {
    fn lock_shared(&self);

    fn try_lock_shared_for(&self, timeout: Duration) -> bool;

    fn unlock_shared(&self);

    fn lock_exclusive(&self);

    fn try_lock_exclusive_for(&self, timeout: Duration) -> bool;

    fn unlock_exclusive(&self);
}

/// Opaque token identifying one acquisition of a stamped lock.
///
/// A stamp must be handed back to the lock that issued it to release the
/// acquisition. Stamps from different modes are not interchangeable, and a
/// stamp obtained by converting a read stamp replaces it.
///
/// 标识一次戳记锁获取的不透明令牌。
/// 必须把戳记交还给签发它的锁才能释放该次获取。不同模式的戳记不能互换，
/// 由读戳记转换得到的写戳记会取代原来的读戳记。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp(u64);

impl Stamp {
    /// Build a stamp from its raw representation. Only meaningful to the
    /// lock implementation that defines the encoding.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Stamp(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// A non-reentrant lock with read, write and optimistic-read modes.
///
/// Every `Option<Stamp>` returned by an acquisition uses `None` for "not
/// acquired": a timeout for the bounded calls, a failed conversion for
/// `try_convert_to_write_lock`, and "currently exclusively locked" for
/// `try_optimistic_read`.
///
/// 具有读、写和乐观读模式的不可重入锁。
/// 所有获取方法返回的 `Option<Stamp>` 都用 `None` 表示"未获取"：
/// 对有界调用是超时，对 `try_convert_to_write_lock` 是转换失败，
/// 对 `try_optimistic_read` 是"当前被独占锁定"。
pub trait RawStampedLock {
    fn read_lock(&self) -> Stamp;

    fn try_read_lock_for(&self, timeout: Duration) -> Option<Stamp>;

    fn unlock_read(&self, stamp: Stamp);

    fn write_lock(&self) -> Stamp;

    fn try_write_lock_for(&self, timeout: Duration) -> Option<Stamp>;

    fn unlock_write(&self, stamp: Stamp);

    /// A stamp to validate later, or `None` if a writer currently holds the lock.
    fn try_optimistic_read(&self) -> Option<Stamp>;

    /// `true` if no writer has held the lock since `stamp` was issued.
    fn validate(&self, stamp: Stamp) -> bool;

    /// Atomically exchange a held stamp for a write stamp without releasing
    /// it first. On `None` the original stamp is still held.
    fn try_convert_to_write_lock(&self, stamp: Stamp) -> Option<Stamp>;

    /// Release a read or write stamp, whichever mode it was issued in.
    fn unlock(&self, stamp: Stamp);
}

impl<L: RawLock + ?Sized> RawLock for &L {
    #[inline]
    fn lock(&self) {
        (**self).lock()
    }

    #[inline]
    fn try_lock_for(&self, timeout: Duration) -> bool {
        (**self).try_lock_for(timeout)
    }

    #[inline]
    fn unlock(&self) {
        (**self).unlock()
    }
}

impl<L: RawReadWriteLock + ?Sized> RawReadWriteLock for &L {
    #[inline]
    fn lock_shared(&self) {
        (**self).lock_shared()
    }

    #[inline]
    fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        (**self).try_lock_shared_for(timeout)
    }

    #[inline]
    fn unlock_shared(&self) {
        (**self).unlock_shared()
    }

    #[inline]
    fn lock_exclusive(&self) {
        (**self).lock_exclusive()
    }

    #[inline]
    fn try_lock_exclusive_for(&self, timeout: Duration) -> bool {
        (**self).try_lock_exclusive_for(timeout)
    }

    #[inline]
    fn unlock_exclusive(&self) {
        (**self).unlock_exclusive()
    }
}

impl<L: RawStampedLock + ?Sized> RawStampedLock for &L {
    #[inline]
    fn read_lock(&self) -> Stamp {
        (**self).read_lock()
    }

    #[inline]
    fn try_read_lock_for(&self, timeout: Duration) -> Option<Stamp> {
        (**self).try_read_lock_for(timeout)
    }

    #[inline]
    fn unlock_read(&self, stamp: Stamp) {
        (**self).unlock_read(stamp)
    }

    #[inline]
    fn write_lock(&self) -> Stamp {
        (**self).write_lock()
    }

    #[inline]
    fn try_write_lock_for(&self, timeout: Duration) -> Option<Stamp> {
        (**self).try_write_lock_for(timeout)
    }

    #[inline]
    fn unlock_write(&self, stamp: Stamp) {
        (**self).unlock_write(stamp)
    }

    #[inline]
    fn try_optimistic_read(&self) -> Option<Stamp> {
        (**self).try_optimistic_read()
    }

    #[inline]
    fn validate(&self, stamp: Stamp) -> bool {
        (**self).validate(stamp)
    }

    #[inline]
    fn try_convert_to_write_lock(&self, stamp: Stamp) -> Option<Stamp> {
        (**self).try_convert_to_write_lock(stamp)
    }

    #[inline]
    fn unlock(&self, stamp: Stamp) {
        (**self).unlock(stamp)
    }
}
