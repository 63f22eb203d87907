//! Functional-style lock wrappers and small synchronisation utilities.
//!
//! The core is a family of wrappers that run a closure while holding a lock
//! and release it on every exit path:
//!
//! - [`WrappedLock`] over a mutual-exclusion lock,
//! - [`WrappedReadWriteLock`] exposing both sides of a reader/writer lock,
//! - [`WrappedStampedLock`] over a [`StampedLock`], with pessimistic and
//!   optimistic reads, writes, and a read-to-write upgrade (`write_if`).
//!
//! Every operation has a `_timeout` variant that gives up with
//! [`AcquireTimeout`] instead of running the work when the lock cannot be
//! acquired in time.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use wrapped_sync::{TestFailedLockContext, WrappedStampedLock};
//!
//! let lock = WrappedStampedLock::new();
//! let slots = AtomicUsize::new(0);
//!
//! let claimed = lock.write_if(
//!     || slots.load(Ordering::Relaxed) < 4,
//!     || { slots.fetch_add(1, Ordering::Relaxed); true },
//!     || false,
//!     TestFailedLockContext::NoLock,
//! );
//! assert!(claimed);
//! ```
//!
//! 函数式风格的锁包装器以及若干小型同步工具。
//! 核心是一组在持有锁时运行闭包、并在每条退出路径上释放锁的包装器。
//! 每个操作都有 `_timeout` 变体：当无法按时获取锁时，返回 `AcquireTimeout`
//! 而不运行操作。

mod attempter;
mod change;
mod clock;
mod error;
mod gate;
mod lock;
mod memoise;
mod on_error;
mod raw;
mod simple;
mod stamped;
mod state;
mod sync;
mod uninterruptible;
mod wrapped_stamped;

pub use attempter::{FailedAttempt, TimeBoundAttempter};
pub use change::{ChangeChecker, ChangedValue, OnChangeNotifier};
pub use clock::{Clock, MonotonicClock};
pub use error::{AcquireTimeout, RetryRequested};
pub use gate::{GateBarrier, GateState, TimeBoundOpenResult};
pub use lock::{ReadHalf, WrappedLock, WrappedReadWriteLock, WriteHalf};
pub use memoise::RefreshableMemoisingSupplier;
pub use on_error::ActionOnError;
pub use raw::{RawLock, RawReadWriteLock, RawStampedLock, Stamp};
pub use simple::SimpleLock;
pub use stamped::StampedLock;
pub use wrapped_stamped::{
    TestFailedLockContext, TestOutcome, WrappedStampedLock, WrappedStampedLockBuilder,
};

#[cfg(test)]
mod tests;
