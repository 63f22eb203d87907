use crate::raw::{RawReadWriteLock, RawStampedLock, Stamp};
use crate::state::{
    LockState, MODE_MASK, MODE_SHIFT, OPTIMISTIC_MODE, READ_MODE, WRITE_MODE, WRITER_BIT,
};
use crate::sync::{AtomicU64, Condvar, Mutex, Ordering, fence};
use crate::uninterruptible::{deadline_after, wait_until};
use std::time::{Duration, Instant};

/// A non-reentrant stamped lock with pessimistic read, write and optimistic
/// read modes.
///
/// Pessimistic readers and writers block on an internal mutex and condition
/// variables. Optimistic readers only load a version counter that every
/// write acquisition and release bumps, so they never block and never
/// contend with each other. Waiting writers take precedence over newly
/// arriving readers.
///
/// The lock is not reentrant: a thread already holding a stamp that asks
/// for a conflicting one deadlocks.
///
/// **Typical Usage**:
/// ```
/// use wrapped_sync::{RawStampedLock, StampedLock};
///
/// let lock = StampedLock::new();
///
/// let stamp = lock.try_optimistic_read().expect("not write locked");
/// // read shared state...
/// assert!(lock.validate(stamp));
///
/// let write = lock.write_lock();
/// assert!(!lock.validate(stamp));
/// lock.unlock_write(write);
/// ```
///
/// 具有悲观读、写和乐观读模式的不可重入戳记锁。
/// 悲观读者与写者在内部互斥量和条件变量上阻塞。乐观读者只读取一个版本
/// 计数器，每次写获取和释放都会推进它，因此乐观读者从不阻塞，彼此之间
/// 也不竞争。等待中的写者优先于新到达的读者。
/// 该锁不可重入：已持有戳记的线程再请求冲突的戳记会死锁。
#[derive(Debug)]
pub struct StampedLock {
    /// Even while unlocked for writing, odd while a writer holds the lock.
    /// 无写者时为偶数，写者持有锁时为奇数。
    version: AtomicU64,
    state: Mutex<LockState>,
    readers_cv: Condvar,
    writers_cv: Condvar,
}

#[inline]
fn encode(version: u64, mode: u64) -> Stamp {
    Stamp::from_raw((version << MODE_SHIFT) | mode)
}

#[inline]
fn mode_of(stamp: Stamp) -> u64 {
    stamp.into_raw() & MODE_MASK
}

#[inline]
fn version_of(stamp: Stamp) -> u64 {
    stamp.into_raw() >> MODE_SHIFT
}

impl StampedLock {
    pub fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
            state: Mutex::new(LockState::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
        }
    }

    /// Acquire a read stamp only if it is available right now.
    /// 仅当此刻可用时获取读戳记。
    #[inline]
    pub fn try_read_lock(&self) -> Option<Stamp> {
        self.acquire_read(Some(Instant::now()))
    }

    /// Acquire a write stamp only if it is available right now.
    /// 仅当此刻可用时获取写戳记。
    #[inline]
    pub fn try_write_lock(&self) -> Option<Stamp> {
        self.acquire_write(Some(Instant::now()))
    }

    /// `true` while a writer holds the lock. The answer may be stale as
    /// soon as it is returned.
    pub fn is_write_locked(&self) -> bool {
        self.version.load(Ordering::Acquire) & WRITER_BIT != 0
    }

    /// Number of pessimistic read stamps currently outstanding.
    pub fn read_lock_count(&self) -> usize {
        self.state.lock().readers
    }

    pub fn is_read_locked(&self) -> bool {
        self.read_lock_count() > 0
    }

    fn acquire_read(&self, deadline: Option<Instant>) -> Option<Stamp> {
        let state = self.state.lock();
        let (mut state, acquired) =
            wait_until(&self.readers_cv, state, deadline, |s| s.blocks_reader());
        if !acquired {
            return None;
        }

        state.readers += 1;
        // Stable: writers only move the version while holding the mutex.
        Some(encode(self.version.load(Ordering::Relaxed), READ_MODE))
    }

    fn release_read(&self) {
        let mut state = self.state.lock();
        assert!(
            state.readers > 0,
            "BUG: Releasing a read stamp while no read stamp is held."
        );

        state.readers -= 1;
        if state.readers == 0 {
            self.writers_cv.notify_all();
        }
    }

    fn acquire_write(&self, deadline: Option<Instant>) -> Option<Stamp> {
        let mut state = self.state.lock();
        state.waiting_writers += 1;
        let (mut state, acquired) =
            wait_until(&self.writers_cv, state, deadline, |s| s.blocks_writer());
        state.waiting_writers -= 1;

        if !acquired {
            // Readers queued behind this writer may proceed now.
            if !state.blocks_reader() {
                self.readers_cv.notify_all();
            }
            return None;
        }

        state.writer = true;
        Some(encode(self.begin_write(), WRITE_MODE))
    }

    fn release_write(&self) {
        let mut state = self.state.lock();
        assert!(
            state.writer,
            "BUG: Releasing a write stamp while no write stamp is held."
        );

        self.version.fetch_add(1, Ordering::Release);
        state.writer = false;

        if state.waiting_writers > 0 {
            self.writers_cv.notify_all();
        } else {
            self.readers_cv.notify_all();
        }
    }

    /// Move the version to odd. Must be called with the mutex held.
    /// 把版本推进为奇数。必须在持有互斥量时调用。
    #[inline]
    fn begin_write(&self) -> u64 {
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        // Orders the odd version before any write the holder makes.
        fence(Ordering::Release);
        version
    }
}

impl Default for StampedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawStampedLock for StampedLock {
    #[inline]
    fn read_lock(&self) -> Stamp {
        match self.acquire_read(None) {
            Some(stamp) => stamp,
            None => unreachable!("unbounded read acquisition cannot time out"),
        }
    }

    #[inline]
    fn try_read_lock_for(&self, timeout: Duration) -> Option<Stamp> {
        self.acquire_read(deadline_after(timeout))
    }

    fn unlock_read(&self, stamp: Stamp) {
        assert_eq!(
            mode_of(stamp),
            READ_MODE,
            "BUG: unlock_read called with a stamp that is not a read stamp."
        );
        self.release_read();
    }

    #[inline]
    fn write_lock(&self) -> Stamp {
        match self.acquire_write(None) {
            Some(stamp) => stamp,
            None => unreachable!("unbounded write acquisition cannot time out"),
        }
    }

    #[inline]
    fn try_write_lock_for(&self, timeout: Duration) -> Option<Stamp> {
        self.acquire_write(deadline_after(timeout))
    }

    fn unlock_write(&self, stamp: Stamp) {
        assert_eq!(
            mode_of(stamp),
            WRITE_MODE,
            "BUG: unlock_write called with a stamp that is not a write stamp."
        );
        assert_eq!(
            version_of(stamp),
            self.version.load(Ordering::Relaxed),
            "BUG: unlock_write called with a stale write stamp."
        );
        self.release_write();
    }

    #[inline]
    fn try_optimistic_read(&self) -> Option<Stamp> {
        let version = self.version.load(Ordering::Acquire);
        if version & WRITER_BIT != 0 {
            None
        } else {
            Some(encode(version, OPTIMISTIC_MODE))
        }
    }

    #[inline]
    fn validate(&self, stamp: Stamp) -> bool {
        // Orders the caller's reads before the version re-check.
        fence(Ordering::Acquire);
        self.version.load(Ordering::Relaxed) == version_of(stamp)
    }

    fn try_convert_to_write_lock(&self, stamp: Stamp) -> Option<Stamp> {
        let mut state = self.state.lock();
        let current = self.version.load(Ordering::Relaxed);

        match mode_of(stamp) {
            WRITE_MODE => (state.writer && version_of(stamp) == current).then_some(stamp),
            READ_MODE => {
                assert!(
                    state.readers > 0,
                    "BUG: Converting a read stamp while no read stamp is held."
                );
                if state.writer || state.readers != 1 {
                    return None;
                }
                state.readers = 0;
                state.writer = true;
                Some(encode(self.begin_write(), WRITE_MODE))
            }
            OPTIMISTIC_MODE => {
                if state.blocks_writer() || version_of(stamp) != current {
                    return None;
                }
                state.writer = true;
                Some(encode(self.begin_write(), WRITE_MODE))
            }
            _ => panic!("BUG: Converting a stamp that was not issued by a StampedLock."),
        }
    }

    fn unlock(&self, stamp: Stamp) {
        match mode_of(stamp) {
            READ_MODE => self.unlock_read(stamp),
            WRITE_MODE => self.unlock_write(stamp),
            _ => panic!("BUG: unlock called with a stamp that holds no lock."),
        }
    }
}

/// Mode-less view used by the read and write halves.
/// 读写两半所使用的无戳记视图。
impl RawReadWriteLock for StampedLock {
    #[inline]
    fn lock_shared(&self) {
        self.read_lock();
    }

    #[inline]
    fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        self.try_read_lock_for(timeout).is_some()
    }

    #[inline]
    fn unlock_shared(&self) {
        self.release_read();
    }

    #[inline]
    fn lock_exclusive(&self) {
        self.write_lock();
    }

    #[inline]
    fn try_lock_exclusive_for(&self, timeout: Duration) -> bool {
        self.try_write_lock_for(timeout).is_some()
    }

    #[inline]
    fn unlock_exclusive(&self) {
        self.release_write();
    }
}
