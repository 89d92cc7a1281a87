use crate::error::FlowFault;
use crate::log::Log;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Internal clock state, shared via [`Rc`] between the kernel
/// and every timer it creates.
struct ClockState {
    time: Cell<f64>,
    last_delta: Cell<f64>,
    log: Log,
}

/// Kernel time, accumulated from caller-supplied deltas.
///
/// A `Clock` can be cloned cheaply; all clones observe the same time.
/// The kernel advances it once per `update`, timers only read it.
/// Time is monotonic: a negative or non-finite delta is clamped to
/// zero and reported through the log.
#[derive(Clone)]
pub struct Clock {
    state: Rc<ClockState>,
}

impl Clock {
    pub(crate) fn new(origin: f64, log: Log) -> Self {
        Self {
            state: Rc::new(ClockState {
                time: Cell::new(origin),
                last_delta: Cell::new(0.0),
                log,
            }),
        }
    }

    /// Seconds accumulated since kernel creation.
    #[inline]
    pub fn now(&self) -> f64 {
        self.state.time.get()
    }

    /// Delta passed to the most recent `update` (after clamping).
    #[inline]
    pub fn last_delta(&self) -> f64 {
        self.state.last_delta.get()
    }

    /// Advance time by `delta` seconds. Only the kernel calls this.
    pub(crate) fn advance(&self, delta: f64) {
        let delta = if delta.is_finite() && delta >= 0.0 {
            delta
        } else {
            self.state.log.warn(
                &FlowFault::invalid_delta(format!("update delta {delta} clamped to 0")).to_string(),
            );
            0.0
        };
        self.state.last_delta.set(delta);
        self.state.time.set(self.state.time.get() + delta);
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("now", &self.now())
            .field("last_delta", &self.last_delta())
            .finish()
    }
}
