use crate::sync::{Condvar, Mutex};
use crate::uninterruptible::{deadline_after, wait_until};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    Open,
    Closed,
}

/// Result of a bounded [`GateBarrier::await_open_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeBoundOpenResult {
    Open,
    TimedOut,
}

/// A gate that is either open or closed. Threads waiting on a closed gate
/// block until another thread opens it. A gate may be opened and closed any
/// number of times.
///
/// ```
/// use std::time::Duration;
/// use wrapped_sync::{GateBarrier, GateState, TimeBoundOpenResult};
///
/// let gate = GateBarrier::new(GateState::Closed);
/// assert_eq!(gate.await_open_timeout(Duration::ZERO), TimeBoundOpenResult::TimedOut);
///
/// gate.open();
/// gate.await_open();
/// ```
///
/// 一个处于打开或关闭状态的闸门。在关闭的闸门上等待的线程会阻塞，
/// 直到另一个线程打开它。闸门可以被任意次地打开和关闭。
#[derive(Debug)]
pub struct GateBarrier {
    state: Mutex<GateState>,
    opened: Condvar,
}

impl GateBarrier {
    pub fn new(initial_state: GateState) -> Self {
        Self {
            state: Mutex::new(initial_state),
            opened: Condvar::new(),
        }
    }

    /// The current state, which may change as soon as it is returned.
    /// 当前状态，返回后随时可能改变。
    pub fn state(&self) -> GateState {
        *self.state.lock()
    }

    pub fn open(&self) -> &Self {
        *self.state.lock() = GateState::Open;
        self.opened.notify_all();
        self
    }

    pub fn close(&self) -> &Self {
        *self.state.lock() = GateState::Closed;
        self
    }

    /// Block until the gate is open.
    pub fn await_open(&self) {
        let state = self.state.lock();
        let (_state, _opened) =
            wait_until(&self.opened, state, None, |s| *s == GateState::Closed);
    }

    /// Block until the gate is open or `timeout` has passed.
    ///
    /// 阻塞直到闸门打开或 `timeout` 到期。
    pub fn await_open_timeout(&self, timeout: Duration) -> TimeBoundOpenResult {
        let state = self.state.lock();
        let (_state, opened) = wait_until(&self.opened, state, deadline_after(timeout), |s| {
            *s == GateState::Closed
        });

        if opened {
            TimeBoundOpenResult::Open
        } else {
            TimeBoundOpenResult::TimedOut
        }
    }
}
