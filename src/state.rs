/// Default number of optimistic attempts before falling back to a
/// pessimistic read.
///
/// Kept small: optimistic reads suit short operations, and a short
/// operation that failed validation once will most likely fail again on an
/// immediate retry.
///
/// 回退到悲观读之前的默认乐观尝试次数。
/// 保持较小：乐观读适用于短操作，一个验证失败过的短操作在立即重试时
/// 很可能再次失败。
pub(crate) const DEFAULT_OPTIMISTIC_ATTEMPTS: usize = 2;

/// Low bit of the version counter, set while a writer holds the lock.
/// 版本计数器的最低位，写者持有锁时置位。
pub(crate) const WRITER_BIT: u64 = 1;

/// Stamps carry their mode in the two low bits and the lock version above.
/// 戳记的低两位存放模式，其上存放锁版本。
pub(crate) const MODE_SHIFT: u32 = 2;
pub(crate) const MODE_MASK: u64 = 0b11;
pub(crate) const READ_MODE: u64 = 0b01;
pub(crate) const WRITE_MODE: u64 = 0b10;
pub(crate) const OPTIMISTIC_MODE: u64 = 0b11;

/// Blocking state of a stamped lock, guarded by its mutex.
///
/// The version counter lives outside of it so optimistic readers never
/// touch the mutex.
///
/// 戳记锁的阻塞状态，由其互斥量保护。
/// 版本计数器位于其外部，因此乐观读者从不接触互斥量。
#[derive(Debug, Default)]
pub(crate) struct LockState {
    /// Number of pessimistic read stamps outstanding.
    /// 未释放的悲观读戳记数量。
    pub(crate) readers: usize,
    /// Whether a write stamp is outstanding.
    pub(crate) writer: bool,
    /// Writers blocked in acquisition. New readers queue behind them.
    /// 正在阻塞获取的写者数量。新读者排在它们之后。
    pub(crate) waiting_writers: usize,
}

impl LockState {
    #[inline]
    pub(crate) fn blocks_reader(&self) -> bool {
        self.writer || self.waiting_writers > 0
    }

    #[inline]
    pub(crate) fn blocks_writer(&self) -> bool {
        self.writer || self.readers > 0
    }
}
