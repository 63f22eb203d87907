#[cfg(feature = "loom")]
pub use loom::sync::atomic::{AtomicU64, AtomicUsize, Ordering, fence};
#[cfg(not(feature = "loom"))]
pub use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering, fence};

#[cfg(not(feature = "loom"))]
pub use antidote::{Mutex, MutexGuard};

#[cfg(feature = "loom")]
pub use loom::sync::MutexGuard;

use std::time::Duration;

#[cfg(feature = "loom")]
#[derive(Debug, Default)]
pub struct Mutex<T>(loom::sync::Mutex<T>);

#[cfg(feature = "loom")]
impl<T> Mutex<T> {
    pub fn new(t: T) -> Self {
        Self(loom::sync::Mutex::new(t))
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap()
    }
}

/// Condition variable with a poison-free, result-free surface.
///
/// Under loom timed waits are not modelled: `wait_for` behaves like `wait`.
///
/// 无毒化、无 Result 的条件变量。
/// 在 loom 下不模拟超时等待：`wait_for` 与 `wait` 行为相同。
pub struct Condvar {
    #[cfg(not(feature = "loom"))]
    inner: antidote::Condvar,
    #[cfg(feature = "loom")]
    inner: loom::sync::Condvar,
}

impl Condvar {
    #[cfg(not(feature = "loom"))]
    pub fn new() -> Self {
        Self {
            inner: antidote::Condvar::new(),
        }
    }

    #[cfg(feature = "loom")]
    pub fn new() -> Self {
        Self {
            inner: loom::sync::Condvar::new(),
        }
    }

    #[cfg(not(feature = "loom"))]
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner.wait(guard)
    }

    #[cfg(feature = "loom")]
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner.wait(guard).unwrap()
    }

    #[cfg(not(feature = "loom"))]
    pub fn wait_for<'a, T>(&self, guard: MutexGuard<'a, T>, timeout: Duration) -> MutexGuard<'a, T> {
        self.inner.wait_timeout(guard, timeout).0
    }

    #[cfg(feature = "loom")]
    pub fn wait_for<'a, T>(&self, guard: MutexGuard<'a, T>, _timeout: Duration) -> MutexGuard<'a, T> {
        self.wait(guard)
    }

    pub fn notify_one(&self) {
        self.inner.notify_one();
    }

    pub fn notify_all(&self) {
        self.inner.notify_all();
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Condvar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condvar").finish_non_exhaustive()
    }
}
