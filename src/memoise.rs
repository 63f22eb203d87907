use crate::sync::{AtomicUsize, Mutex, Ordering};

/// A value together with the invalidation count it was loaded under.
#[derive(Debug)]
struct Loaded<T> {
    value: T,
    generation: usize,
}

/// Memoises the value of a loader until it is invalidated.
///
/// The first [`get`](Self::get) loads from the loader and stores the value;
/// later calls return a clone of it. [`invalidate`](Self::invalidate) forces
/// the next `get` to load again. An invalidation that races with a load wins:
/// the value loaded concurrently is not reused by later calls.
///
/// The loader runs outside of any lock, so concurrent callers that miss
/// may each load.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use wrapped_sync::RefreshableMemoisingSupplier;
///
/// let loads = AtomicUsize::new(0);
/// let supplier = RefreshableMemoisingSupplier::new(|| loads.fetch_add(1, Ordering::SeqCst));
///
/// assert_eq!(supplier.get(), 0);
/// assert_eq!(supplier.get(), 0);
/// assert_eq!(supplier.refresh(), 1);
/// ```
///
/// 记忆加载器的值，直到其失效。
/// 第一次 `get` 从加载器加载并保存该值；之后的调用返回它的克隆。
/// `invalidate` 强制下一次 `get` 重新加载。与加载竞争的失效优先：
/// 并发加载得到的值不会被后续调用复用。
/// 加载器在任何锁之外运行，因此同时未命中的调用者可能各自加载。
pub struct RefreshableMemoisingSupplier<T, F> {
    loader: F,
    invalidations: AtomicUsize,
    loaded: Mutex<Option<Loaded<T>>>,
}

impl<T, F> RefreshableMemoisingSupplier<T, F>
where
    T: Clone,
    F: Fn() -> T,
{
    pub fn new(loader: F) -> Self {
        Self {
            loader,
            invalidations: AtomicUsize::new(0),
            loaded: Mutex::new(None),
        }
    }

    /// The memoised value, loading it first if needed.
    /// 记忆的值，必要时先加载。
    pub fn get(&self) -> T {
        // Snapshot before loading: an invalidation during the load leaves the
        // stored generation behind, so the next call reloads.
        let generation = self.invalidations.load(Ordering::Acquire);

        if let Some(loaded) = self.loaded.lock().as_ref() {
            if loaded.generation == generation {
                return loaded.value.clone();
            }
        }

        let value = (self.loader)();
        *self.loaded.lock() = Some(Loaded {
            value: value.clone(),
            generation,
        });
        value
    }

    /// Discard the memoised value; the next [`get`](Self::get) loads again.
    pub fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::AcqRel);
    }

    /// Invalidate, then [`get`](Self::get).
    pub fn refresh(&self) -> T {
        self.invalidate();
        self.get()
    }
}

impl<T: std::fmt::Debug, F> std::fmt::Debug for RefreshableMemoisingSupplier<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshableMemoisingSupplier")
            .field("invalidations", &self.invalidations)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}
