use crate::raw::RawLock;
use crate::sync::{Condvar, Mutex};
use crate::uninterruptible::{deadline_after, wait_until};
use std::time::{Duration, Instant};

/// A plain, non-reentrant mutual-exclusion lock that protects no data of
/// its own. It is the default delegate of [`WrappedLock`](crate::WrappedLock).
///
/// 一个普通的、不可重入的互斥锁，自身不保护任何数据。
/// 它是 `WrappedLock` 的默认委托。
#[derive(Debug)]
pub struct SimpleLock {
    locked: Mutex<bool>,
    released: Condvar,
}

impl SimpleLock {
    pub fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            released: Condvar::new(),
        }
    }

    /// Acquire the lock only if it is free right now.
    #[inline]
    pub fn try_lock(&self) -> bool {
        self.acquire(Some(Instant::now()))
    }

    pub fn is_locked(&self) -> bool {
        *self.locked.lock()
    }

    fn acquire(&self, deadline: Option<Instant>) -> bool {
        let locked = self.locked.lock();
        let (mut locked, acquired) = wait_until(&self.released, locked, deadline, |l| *l);
        if acquired {
            *locked = true;
        }
        acquired
    }
}

impl Default for SimpleLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for SimpleLock {
    #[inline]
    fn lock(&self) {
        self.acquire(None);
    }

    #[inline]
    fn try_lock_for(&self, timeout: Duration) -> bool {
        self.acquire(deadline_after(timeout))
    }

    fn unlock(&self) {
        let mut locked = self.locked.lock();
        assert!(*locked, "BUG: Unlocking a SimpleLock that is not locked.");

        *locked = false;
        self.released.notify_one();
    }
}
