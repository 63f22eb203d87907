use crate::error::AcquireTimeout;
use crate::raw::{RawLock, RawReadWriteLock};
use crate::simple::SimpleLock;
use crate::stamped::StampedLock;
use std::time::Duration;

/// Releases the held lock when dropped, so work that returns early or
/// unwinds still leaves the lock released.
struct Unlocker<'a, L: RawLock>(&'a L);

impl<L: RawLock> Drop for Unlocker<'_, L> {
    #[inline]
    fn drop(&mut self) {
        self.0.unlock();
    }
}

/// Runs work while holding a mutual-exclusion lock.
///
/// ```
/// use std::time::Duration;
/// use wrapped_sync::WrappedLock;
///
/// let lock = WrappedLock::new();
/// assert_eq!(lock.in_lock(|| 1 + 1), 2);
/// assert_eq!(lock.in_lock_timeout(|| "done", Duration::from_millis(10)), Ok("done"));
/// ```
///
/// 在持有互斥锁时运行操作。
#[derive(Debug, Default)]
pub struct WrappedLock<L = SimpleLock> {
    delegate: L,
}

impl WrappedLock<SimpleLock> {
    /// Wrap a fresh [`SimpleLock`].
    pub fn new() -> Self {
        Self::with_lock(SimpleLock::new())
    }
}

impl<L: RawLock> WrappedLock<L> {
    pub fn with_lock(delegate: L) -> Self {
        Self { delegate }
    }

    pub fn delegate(&self) -> &L {
        &self.delegate
    }

    /// Acquire the lock, run `operation` and release the lock on every exit
    /// path. Errors returned by `operation` and panics propagate unchanged.
    ///
    /// 获取锁，运行 `operation`，并在所有退出路径上释放锁。
    /// `operation` 返回的错误与 panic 原样传播。
    pub fn in_lock<T, F>(&self, operation: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.delegate.lock();
        let _unlocker = Unlocker(&self.delegate);
        operation()
    }

    /// As [`in_lock`](Self::in_lock) but waits at most `acquire_timeout` for
    /// the lock. On timeout `operation` is never run.
    ///
    /// 同 `in_lock`，但最多等待 `acquire_timeout`。超时时 `operation` 不会运行。
    pub fn in_lock_timeout<T, F>(
        &self,
        operation: F,
        acquire_timeout: Duration,
    ) -> Result<T, AcquireTimeout>
    where
        F: FnOnce() -> T,
    {
        if !self.delegate.try_lock_for(acquire_timeout) {
            return Err(AcquireTimeout);
        }
        let _unlocker = Unlocker(&self.delegate);
        Ok(operation())
    }
}

/// Shared half of a reader/writer lock, usable wherever a [`RawLock`] is.
/// 读写锁的共享一半，可用于任何需要 `RawLock` 的地方。
#[derive(Debug)]
pub struct ReadHalf<'a, L: ?Sized>(pub(crate) &'a L);

/// Exclusive half of a reader/writer lock.
/// 读写锁的独占一半。
#[derive(Debug)]
pub struct WriteHalf<'a, L: ?Sized>(pub(crate) &'a L);

impl<L: RawReadWriteLock + ?Sized> RawLock for ReadHalf<'_, L> {
    #[inline]
    fn lock(&self) {
        self.0.lock_shared()
    }

    #[inline]
    fn try_lock_for(&self, timeout: Duration) -> bool {
        self.0.try_lock_shared_for(timeout)
    }

    #[inline]
    fn unlock(&self) {
        self.0.unlock_shared()
    }
}

impl<L: RawReadWriteLock + ?Sized> RawLock for WriteHalf<'_, L> {
    #[inline]
    fn lock(&self) {
        self.0.lock_exclusive()
    }

    #[inline]
    fn try_lock_for(&self, timeout: Duration) -> bool {
        self.0.try_lock_exclusive_for(timeout)
    }

    #[inline]
    fn unlock(&self) {
        self.0.unlock_exclusive()
    }
}

/// Exposes the two sides of a reader/writer lock as [`WrappedLock`]s.
///
/// ```
/// use wrapped_sync::WrappedReadWriteLock;
///
/// let lock = WrappedReadWriteLock::new();
/// lock.write_lock().in_lock(|| { /* mutate */ });
/// let seen = lock.read_lock().in_lock(|| 7);
/// assert_eq!(seen, 7);
/// ```
///
/// 将读写锁的两侧暴露为 `WrappedLock`。
#[derive(Debug, Default)]
pub struct WrappedReadWriteLock<L = StampedLock> {
    delegate: L,
}

impl WrappedReadWriteLock<StampedLock> {
    /// Wrap a fresh [`StampedLock`] used as a plain reader/writer lock.
    pub fn new() -> Self {
        Self::with_lock(StampedLock::new())
    }
}

impl<L: RawReadWriteLock> WrappedReadWriteLock<L> {
    pub fn with_lock(delegate: L) -> Self {
        Self { delegate }
    }

    pub fn delegate(&self) -> &L {
        &self.delegate
    }

    pub fn read_lock(&self) -> WrappedLock<ReadHalf<'_, L>> {
        WrappedLock::with_lock(ReadHalf(&self.delegate))
    }

    pub fn write_lock(&self) -> WrappedLock<WriteHalf<'_, L>> {
        WrappedLock::with_lock(WriteHalf(&self.delegate))
    }
}
