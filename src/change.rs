use crate::sync::Mutex;

/// A change observed by a [`ChangeChecker`]: the last known value and the
/// value that replaced it. `None` stands for "no value".
///
/// `ChangeChecker` 观察到的变化：上一个已知值以及取代它的值。`None` 表示"没有值"。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangedValue<T> {
    pub previous: Option<T>,
    pub new: Option<T>,
}

/// Holds the last known value of a source and reports when it changes.
///
/// The last known value starts out as `None`, so the first check against a
/// source that yields a value reports a change.
///
/// ```
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use wrapped_sync::{ChangeChecker, ChangedValue};
///
/// let source = AtomicI32::new(1);
/// let checker = ChangeChecker::new(|| Some(source.load(Ordering::SeqCst)));
///
/// assert_eq!(checker.check_for_change(), Some(ChangedValue { previous: None, new: Some(1) }));
/// assert_eq!(checker.check_for_change(), None);
/// ```
///
/// 保存某个来源的最后已知值，并在其变化时报告。
/// 最后已知值初始为 `None`，因此第一次检查一个有值的来源会报告变化。
pub struct ChangeChecker<T, F> {
    source: F,
    known: Mutex<Option<T>>,
}

impl<T, F> ChangeChecker<T, F>
where
    T: Clone + PartialEq,
    F: Fn() -> Option<T>,
{
    pub fn new(source: F) -> Self {
        Self {
            source,
            known: Mutex::new(None),
        }
    }

    /// Read the source and, if it differs from the last known value, record
    /// it and return the change. Checks are serialised, so each change is
    /// reported exactly once.
    ///
    /// 读取来源，若与最后已知值不同，则记录它并返回该变化。
    /// 检查是串行的，因此每个变化恰好报告一次。
    pub fn check_for_change(&self) -> Option<ChangedValue<T>> {
        let mut known = self.known.lock();
        let latest = (self.source)();
        if *known == latest {
            return None;
        }

        let previous = std::mem::replace(&mut *known, latest.clone());
        Some(ChangedValue {
            previous,
            new: latest,
        })
    }
}

/// A [`ChangeChecker`] that hands each change to a consumer.
///
/// 将每个变化交给消费者的 `ChangeChecker`。
pub struct OnChangeNotifier<T, F, N> {
    checker: ChangeChecker<T, F>,
    notify: N,
}

impl<T, F, N> OnChangeNotifier<T, F, N>
where
    T: Clone + PartialEq,
    F: Fn() -> Option<T>,
    N: Fn(ChangedValue<T>),
{
    pub fn new(source: F, notify: N) -> Self {
        Self::with_checker(ChangeChecker::new(source), notify)
    }

    pub fn with_checker(checker: ChangeChecker<T, F>, notify: N) -> Self {
        Self { checker, notify }
    }

    /// Check the source and notify the consumer if it changed. The consumer
    /// runs after the check has released its lock.
    pub fn check_for_change(&self) {
        if let Some(changed) = self.checker.check_for_change() {
            (self.notify)(changed);
        }
    }
}
