use crate::error::FlowFault;
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use crate::log::Log;
use std::cell::RefCell;
use std::rc::Rc;

/// Single-value slot that completes when assigned.
///
/// Cooperative, never blocking: dependents park themselves with
/// `resume_after(&future)` and read the slot once resumed. A slot is
/// assigned at most once; a force-completed (cancelled or timed-out)
/// future rejects late assignment and its slot stays at the type
/// default.
pub struct Future<T: 'static> {
    lifecycle: Lifecycle,
    slot: RefCell<Option<T>>,
    log: Log,
}

impl<T: 'static> Future<T> {
    pub(crate) fn new(log: Log) -> Rc<Self> {
        Rc::new(Self {
            lifecycle: Lifecycle::new(),
            slot: RefCell::new(None),
            log,
        })
    }

    #[inline]
    pub fn available(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Assign the value and complete. Exactly once: assignment to an
    /// inactive future (including one that already holds a value) is
    /// dropped with a warning.
    pub fn set(&self, value: T) {
        if !self.active() {
            self.log.warn(
                &FlowFault::invalid_member(format!("future {} rejected late value", self.id()))
                    .to_string(),
            );
            return;
        }
        *self.slot.borrow_mut() = Some(value);
        self.complete();
    }

    /// The value if assigned.
    pub fn try_value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.slot.borrow().clone()
    }

    /// The value, or the type default while unassigned.
    pub fn value(&self) -> T
    where
        T: Clone + Default,
    {
        self.try_value().unwrap_or_default()
    }
}

impl<T: 'static> Transient for Future<T> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}
