use crate::clock::{Clock, MonotonicClock};
use crate::error::AcquireTimeout;
use crate::lock::{ReadHalf, WrappedLock, WrappedReadWriteLock, WriteHalf};
use crate::raw::{RawReadWriteLock, RawStampedLock, Stamp};
use crate::stamped::StampedLock;
use crate::state::DEFAULT_OPTIMISTIC_ATTEMPTS;
use std::convert::Infallible;
use std::time::Duration;

/// Where `on_test_failed` runs when the test of a
/// [`write_if`](WrappedStampedLock::write_if) fails.
///
/// 当 `write_if` 的测试失败时 `on_test_failed` 运行的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestFailedLockContext {
    /// Still inside the lock the failed test ran under, so the operation
    /// sees state consistent with the test.
    /// 仍在失败测试所在的锁内，操作看到的状态与测试一致。
    InPessimisticReadLock,
    /// After the lock has been released.
    /// 在锁被释放之后。
    NoLock,
}

/// Which branch of a [`write_if_then`](WrappedStampedLock::write_if_then) ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Holds one stamp and releases it when dropped.
///
/// `held` is false only between releasing a stamp and holding its
/// replacement, which is the window an acquisition timeout can leave open.
struct StampGuard<'a, L: RawStampedLock> {
    lock: &'a L,
    stamp: Stamp,
    held: bool,
    release: fn(&L, Stamp),
}

impl<'a, L: RawStampedLock> StampGuard<'a, L> {
    #[inline]
    fn new(lock: &'a L, stamp: Stamp, release: fn(&L, Stamp)) -> Self {
        Self {
            lock,
            stamp,
            held: true,
            release,
        }
    }

    /// Replace the held stamp without releasing it, as after a conversion.
    #[inline]
    fn replace(&mut self, stamp: Stamp) {
        self.stamp = stamp;
        self.held = true;
    }

    /// Release the held stamp with a mode-specific release.
    #[inline]
    fn release_with(&mut self, release: fn(&L, Stamp)) {
        self.held = false;
        release(self.lock, self.stamp);
    }
}

impl<L: RawStampedLock> Drop for StampGuard<'_, L> {
    #[inline]
    fn drop(&mut self) {
        if self.held {
            self.held = false;
            (self.release)(self.lock, self.stamp);
        }
    }
}

#[inline]
fn blocking_read<L: RawStampedLock>(lock: &L) -> Result<Stamp, Infallible> {
    Ok(lock.read_lock())
}

#[inline]
fn blocking_write<L: RawStampedLock>(lock: &L) -> Result<Stamp, Infallible> {
    Ok(lock.write_lock())
}

#[inline]
fn timed_read<L: RawStampedLock>(lock: &L, timeout: Duration) -> Result<Stamp, AcquireTimeout> {
    lock.try_read_lock_for(timeout).ok_or(AcquireTimeout)
}

#[inline]
fn timed_write<L: RawStampedLock>(lock: &L, timeout: Duration) -> Result<Stamp, AcquireTimeout> {
    lock.try_write_lock_for(timeout).ok_or(AcquireTimeout)
}

#[inline]
fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Builder for configuring a [`WrappedStampedLock`].
///
/// - `optimistic_attempts`: optimistic attempts before falling back to a
///   pessimistic read
/// - `clock`: monotonic time source for timeout budgeting
///
/// # Example
/// ```
/// use wrapped_sync::WrappedStampedLock;
///
/// let lock = WrappedStampedLock::builder()
///     .optimistic_attempts(4)
///     .build();
/// assert_eq!(lock.optimistic_read(|| 42), 42);
/// ```
///
/// 用于配置 `WrappedStampedLock` 的构建器。
#[derive(Debug, Clone)]
pub struct WrappedStampedLockBuilder<C = MonotonicClock> {
    optimistic_attempts: usize,
    clock: C,
}

impl WrappedStampedLockBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            optimistic_attempts: DEFAULT_OPTIMISTIC_ATTEMPTS,
            clock: MonotonicClock,
        }
    }
}

impl Default for WrappedStampedLockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> WrappedStampedLockBuilder<C> {
    /// Set how many optimistic attempts are made before falling back to a
    /// pessimistic read. `0` makes every optimistic read pessimistic.
    ///
    /// Default: `2`
    ///
    /// 设置回退到悲观读之前的乐观尝试次数。`0` 使每次乐观读都变为悲观读。
    #[inline]
    pub fn optimistic_attempts(mut self, attempts: usize) -> Self {
        self.optimistic_attempts = attempts;
        self
    }

    /// Set the clock used to split a timeout budget across acquisitions.
    /// 设置用于在多次获取之间分配超时预算的时钟。
    #[inline]
    pub fn clock<C2: Clock>(self, clock: C2) -> WrappedStampedLockBuilder<C2> {
        WrappedStampedLockBuilder {
            optimistic_attempts: self.optimistic_attempts,
            clock,
        }
    }

    /// Build over a fresh [`StampedLock`].
    #[inline]
    pub fn build(self) -> WrappedStampedLock<StampedLock, C> {
        self.build_with(StampedLock::new())
    }

    /// Build over a caller-supplied stamped lock.
    #[inline]
    pub fn build_with<L: RawStampedLock>(self, delegate: L) -> WrappedStampedLock<L, C> {
        WrappedStampedLock {
            delegate,
            clock: self.clock,
            optimistic_attempts: self.optimistic_attempts,
        }
    }
}

/// Runs work under a non-reentrant stamped lock, in a functional style.
///
/// **Pessimistic reads** run while no writer holds the lock; any number of
/// pessimistic and optimistic readers may overlap.
///
/// **Optimistic reads** may start while any other stamp, including a write
/// stamp, is outstanding. Afterwards the lock is checked for a writer having
/// held it in the meantime, and if so the result is thrown away. After a
/// few failed attempts the work runs once more under a pessimistic read.
/// Work given to an optimistic read may therefore run several times and
/// concurrently with a writer: it must only read.
///
/// **Writes** exclude every other pessimistic reader and writer; only
/// optimistic readers may overlap them.
///
/// **Write-if** runs a test under a read stamp and upgrades to a write stamp
/// only while the test holds.
///
/// Every variant releases what it acquired on every exit path, including
/// when the work panics. Errors returned from the work are passed through
/// unchanged. The `_timeout` variants return [`AcquireTimeout`] without
/// running the work if they cannot acquire in time.
///
/// **Typical Usage**:
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use wrapped_sync::WrappedStampedLock;
///
/// let lock = WrappedStampedLock::new();
/// let balance = AtomicU64::new(10);
///
/// lock.write(|| balance.fetch_add(5, Ordering::Relaxed));
/// let seen = lock.optimistic_read(|| balance.load(Ordering::Relaxed));
/// assert_eq!(seen, 15);
/// ```
///
/// 以函数式风格在不可重入的戳记锁下运行操作。
///
/// **悲观读**在没有写者持有锁时运行；任意数量的悲观读者和乐观读者可以重叠。
///
/// **乐观读**可以在任何其他戳记（包括写戳记）未释放时开始。之后检查期间是否
/// 有写者持有过锁，若有则丢弃结果。几次尝试失败后，操作会在悲观读下再运行
/// 一次。因此交给乐观读的操作可能运行多次，并且可能与写者并发：它只能读取。
///
/// **写**排斥所有其他悲观读者与写者；只有乐观读者可以与之重叠。
///
/// **条件写**在读戳记下运行测试，仅当测试成立时才升级为写戳记。
///
/// 所有变体都会在每条退出路径上释放所获取的锁，包括操作 panic 时。
/// 操作返回的错误原样传递。`_timeout` 变体在无法按时获取时返回
/// `AcquireTimeout`，且不会运行操作。
#[derive(Debug)]
pub struct WrappedStampedLock<L = StampedLock, C = MonotonicClock> {
    delegate: L,
    clock: C,
    optimistic_attempts: usize,
}

impl WrappedStampedLock {
    /// Wrap a fresh [`StampedLock`] with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> WrappedStampedLockBuilder {
        WrappedStampedLockBuilder::new()
    }
}

impl Default for WrappedStampedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: RawStampedLock> WrappedStampedLock<L> {
    /// Wrap a caller-supplied stamped lock with default settings.
    pub fn with_lock(delegate: L) -> Self {
        WrappedStampedLockBuilder::new().build_with(delegate)
    }
}

impl<L, C> WrappedStampedLock<L, C>
where
    L: RawStampedLock + RawReadWriteLock,
{
    /// View the delegate as a plain reader/writer lock.
    pub fn as_read_write_lock(&self) -> WrappedReadWriteLock<&L> {
        WrappedReadWriteLock::with_lock(&self.delegate)
    }

    pub fn as_read_lock(&self) -> WrappedLock<ReadHalf<'_, L>> {
        WrappedLock::with_lock(ReadHalf(&self.delegate))
    }

    pub fn as_write_lock(&self) -> WrappedLock<WriteHalf<'_, L>> {
        WrappedLock::with_lock(WriteHalf(&self.delegate))
    }
}

impl<L: RawStampedLock, C: Clock> WrappedStampedLock<L, C> {
    pub fn delegate(&self) -> &L {
        &self.delegate
    }

    #[inline]
    pub fn optimistic_attempts(&self) -> usize {
        self.optimistic_attempts
    }

    fn pessimistic_read_with<T, E, A, F>(&self, acquire: A, operation: F) -> Result<T, E>
    where
        A: FnOnce(&L) -> Result<Stamp, E>,
        F: FnOnce() -> T,
    {
        let stamp = acquire(&self.delegate)?;
        let _guard = StampGuard::new(&self.delegate, stamp, L::unlock_read);
        Ok(operation())
    }

    /// Run `operation` under a pessimistic read stamp.
    ///
    /// 在悲观读戳记下运行 `operation`。
    pub fn pessimistic_read<T, F>(&self, operation: F) -> T
    where
        F: FnOnce() -> T,
    {
        infallible(self.pessimistic_read_with(blocking_read, operation))
    }

    /// Run `operation` under a pessimistic read stamp, waiting at most
    /// `acquire_timeout` for it.
    pub fn pessimistic_read_timeout<T, F>(
        &self,
        operation: F,
        acquire_timeout: Duration,
    ) -> Result<T, AcquireTimeout>
    where
        F: FnOnce() -> T,
    {
        self.pessimistic_read_with(|lock| timed_read(lock, acquire_timeout), operation)
    }

    fn optimistic_read_with<T, E, F, P>(&self, operation: F, fallback: P) -> Result<T, E>
    where
        F: Fn() -> T,
        P: FnOnce(F) -> Result<T, E>,
    {
        for _ in 0..self.optimistic_attempts {
            // `None` while exclusively locked: the attempt is spent without running the work.
            if let Some(stamp) = self.delegate.try_optimistic_read() {
                let result = operation();
                if self.delegate.validate(stamp) {
                    return Ok(result);
                }
            }
        }

        fallback(operation)
    }

    /// Run `operation` optimistically, falling back to a pessimistic read if
    /// no attempt validates.
    ///
    /// `operation` may run concurrently with a writer and may run more than
    /// once, so it must only observe state and must not act on what it
    /// observed. Suppose it loads a value and panics when the value is out of
    /// range: a concurrent write can make the load observe a value that was
    /// never stored, and the panic escapes before validation could discard
    /// the read. Returning the value instead lets validation reject it and
    /// the read be repeated. Shared state must still be read through types
    /// that tolerate concurrent writes, such as atomics; if the read walks a
    /// structure a writer can reshape, use
    /// [`pessimistic_read`](Self::pessimistic_read) instead.
    ///
    /// 乐观地运行 `operation`，若没有任何尝试通过验证则回退到悲观读。
    ///
    /// `operation` 可能与写者并发运行，也可能运行多次，因此它只能观察状态，
    /// 而不能根据观察到的内容采取行动。假设它读取一个值并在值越界时 panic：
    /// 并发写可能让读取看到一个从未被存储过的值，而 panic 会在验证丢弃此次
    /// 读取之前逃逸。改为返回该值，验证便能拒绝它并重新读取。共享状态仍需通过
    /// 能容忍并发写的类型（例如原子类型）读取；如果读取要遍历一个写者可能
    /// 改变形状的结构，请改用 `pessimistic_read`。
    pub fn optimistic_read<T, F>(&self, operation: F) -> T
    where
        F: Fn() -> T,
    {
        infallible(self.optimistic_read_with(operation, |operation| {
            Ok(self.pessimistic_read(operation))
        }))
    }

    /// As [`optimistic_read`](Self::optimistic_read). The pessimistic
    /// fallback waits only for what is left of `acquire_timeout` after the
    /// optimistic attempts.
    ///
    /// 同 `optimistic_read`。悲观回退只等待乐观尝试之后 `acquire_timeout` 的剩余部分。
    pub fn optimistic_read_timeout<T, F>(
        &self,
        operation: F,
        acquire_timeout: Duration,
    ) -> Result<T, AcquireTimeout>
    where
        F: Fn() -> T,
    {
        let start = self.clock.now();

        self.optimistic_read_with(operation, |operation| {
            let remaining = self.clock.remaining(start, acquire_timeout);
            self.pessimistic_read_timeout(operation, remaining)
        })
    }

    fn write_with<T, E, A, F>(&self, acquire: A, operation: F) -> Result<T, E>
    where
        A: FnOnce(&L) -> Result<Stamp, E>,
        F: FnOnce() -> T,
    {
        let stamp = acquire(&self.delegate)?;
        let _guard = StampGuard::new(&self.delegate, stamp, L::unlock_write);
        Ok(operation())
    }

    /// Run `operation` under a write stamp. Only optimistic readers may
    /// overlap it.
    ///
    /// 在写戳记下运行 `operation`。只有乐观读者可能与之重叠。
    pub fn write<T, F>(&self, operation: F) -> T
    where
        F: FnOnce() -> T,
    {
        infallible(self.write_with(blocking_write, operation))
    }

    pub fn write_timeout<T, F>(
        &self,
        operation: F,
        acquire_timeout: Duration,
    ) -> Result<T, AcquireTimeout>
    where
        F: FnOnce() -> T,
    {
        self.write_with(|lock| timed_write(lock, acquire_timeout), operation)
    }

    fn write_if_with<T, E, P, Q, R, A, W>(
        &self,
        mut test: P,
        on_test_passed: Q,
        on_test_failed: R,
        context: TestFailedLockContext,
        acquire_read: A,
        mut acquire_write: W,
    ) -> Result<T, E>
    where
        P: FnMut() -> bool,
        Q: FnOnce() -> T,
        R: FnOnce() -> T,
        A: FnOnce(&L) -> Result<Stamp, E>,
        W: FnMut(&L) -> Result<Stamp, E>,
    {
        let stamp = acquire_read(&self.delegate)?;
        // Released through `unlock` since it may end up as a read or a write stamp.
        let mut guard = StampGuard::new(&self.delegate, stamp, L::unlock);

        while test() {
            match self.delegate.try_convert_to_write_lock(guard.stamp) {
                Some(write_stamp) => {
                    guard.replace(write_stamp);
                    return Ok(on_test_passed());
                }
                None => {
                    // State may change between these two, so the test runs again.
                    guard.release_with(L::unlock_read);
                    guard.replace(acquire_write(&self.delegate)?);
                }
            }
        }

        match context {
            TestFailedLockContext::InPessimisticReadLock => Ok(on_test_failed()),
            TestFailedLockContext::NoLock => {
                drop(guard);
                Ok(on_test_failed())
            }
        }
    }

    /// Run `test` under a pessimistic read stamp. If it passes, upgrade to a
    /// write stamp and return the result of `on_test_passed`; otherwise
    /// return the result of `on_test_failed`, run in the lock context given by
    /// `context`.
    ///
    /// The upgrade first tries to convert the read stamp in place. If another
    /// reader prevents that, the read stamp is released, a write stamp is
    /// acquired and `test` runs again, since the state may have changed in
    /// between. `test` may therefore run more than once.
    ///
    /// 在悲观读戳记下运行 `test`。若通过，则升级为写戳记并返回
    /// `on_test_passed` 的结果；否则返回 `on_test_failed` 的结果，
    /// 其运行的锁上下文由 `context` 决定。
    ///
    /// 升级时首先尝试原地转换读戳记。如果其他读者阻止了转换，则释放读戳记、
    /// 获取写戳记并再次运行 `test`，因为其间状态可能已改变。因此 `test`
    /// 可能运行不止一次。
    pub fn write_if<T, P, Q, R>(
        &self,
        test: P,
        on_test_passed: Q,
        on_test_failed: R,
        context: TestFailedLockContext,
    ) -> T
    where
        P: FnMut() -> bool,
        Q: FnOnce() -> T,
        R: FnOnce() -> T,
    {
        infallible(self.write_if_with(
            test,
            on_test_passed,
            on_test_failed,
            context,
            blocking_read,
            blocking_write,
        ))
    }

    /// As [`write_if`](Self::write_if), with every acquisition bounded by what
    /// is left of `acquire_timeout`.
    ///
    /// 同 `write_if`，每次获取都以 `acquire_timeout` 的剩余部分为界。
    pub fn write_if_timeout<T, P, Q, R>(
        &self,
        test: P,
        on_test_passed: Q,
        on_test_failed: R,
        context: TestFailedLockContext,
        acquire_timeout: Duration,
    ) -> Result<T, AcquireTimeout>
    where
        P: FnMut() -> bool,
        Q: FnOnce() -> T,
        R: FnOnce() -> T,
    {
        let start = self.clock.now();
        let remaining = || self.clock.remaining(start, acquire_timeout);

        self.write_if_with(
            test,
            on_test_passed,
            on_test_failed,
            context,
            |lock| timed_read(lock, remaining()),
            |lock| timed_write(lock, remaining()),
        )
    }

    /// Side-effecting [`write_if`](Self::write_if): runs `on_test_passed`
    /// under a write stamp or `on_test_failed` with no lock held, and reports
    /// which one ran.
    pub fn write_if_then<P, Q, R>(
        &self,
        test: P,
        on_test_passed: Q,
        on_test_failed: R,
    ) -> TestOutcome
    where
        P: FnMut() -> bool,
        Q: FnOnce(),
        R: FnOnce(),
    {
        self.write_if(
            test,
            || {
                on_test_passed();
                TestOutcome::Passed
            },
            || {
                on_test_failed();
                TestOutcome::Failed
            },
            TestFailedLockContext::NoLock,
        )
    }

    pub fn write_if_then_timeout<P, Q, R>(
        &self,
        test: P,
        on_test_passed: Q,
        on_test_failed: R,
        acquire_timeout: Duration,
    ) -> Result<TestOutcome, AcquireTimeout>
    where
        P: FnMut() -> bool,
        Q: FnOnce(),
        R: FnOnce(),
    {
        self.write_if_timeout(
            test,
            || {
                on_test_passed();
                TestOutcome::Passed
            },
            || {
                on_test_failed();
                TestOutcome::Failed
            },
            TestFailedLockContext::NoLock,
            acquire_timeout,
        )
    }
}
