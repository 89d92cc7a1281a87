use crate::flow::barrier::Barrier;
use crate::flow::future::Future;
use crate::flow::timer::Timer;
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use crate::flow::trigger::Trigger;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A primitive raced against a timeout timer.
///
/// Whichever leg finishes first completes the wrapper. If the timer
/// wins, the fire-once `timed_out` queue runs and the wrapped
/// primitive is force-completed, abandoning unmet work. If the
/// primitive wins, the timer is cancelled and `timed_out` never
/// fires. The factory schedules the timeout leg into the kernel
/// root, so timed composites tick without manual wiring.
pub struct Timed<P: Transient + 'static> {
    lifecycle: Lifecycle,
    inner: Rc<P>,
    timer: Rc<Timer>,
    timed_out: Cell<bool>,
    on_timeout: RefCell<Vec<Box<dyn FnOnce()>>>,
}

pub type TimedBarrier = Timed<Barrier>;
pub type TimedTrigger = Timed<Trigger>;
pub type TimedFuture<T> = Timed<Future<T>>;

impl<P: Transient + 'static> Timed<P> {
    pub(crate) fn new(inner: Rc<P>, timer: Rc<Timer>) -> Rc<Self> {
        let timed = Rc::new(Self {
            lifecycle: Lifecycle::new(),
            inner,
            timer,
            timed_out: Cell::new(false),
            on_timeout: RefCell::new(Vec::new()),
        });

        // Timeout leg.
        let weak = Rc::downgrade(&timed);
        timed.timer.on_elapsed(move || {
            if let Some(timed) = weak.upgrade() {
                timed.expire();
            }
        });

        // Primitive leg.
        let weak = Rc::downgrade(&timed);
        timed.inner.lifecycle().on_complete(move || {
            if let Some(timed) = weak.upgrade() {
                timed.settle();
            }
        });

        // Cancelling the wrapper cancels the timeout leg with it.
        let weak = Rc::downgrade(&timed);
        timed.lifecycle.on_complete(move || {
            if let Some(timed) = weak.upgrade() {
                timed.timer.complete();
            }
        });

        timed
    }

    fn expire(&self) {
        if !self.active() {
            return;
        }
        self.timed_out.set(true);
        let handlers = self.on_timeout.take();
        for handler in handlers {
            handler();
        }
        self.inner.complete();
        self.complete();
    }

    fn settle(&self) {
        if !self.active() {
            return;
        }
        self.timer.complete();
        self.complete();
    }

    /// Whether the timeout leg won.
    pub fn timed_out(&self) -> bool {
        self.timed_out.get()
    }

    /// Fire-once hook for the timeout leg. Runs immediately if the
    /// timeout already fired; never runs if the primitive won.
    pub fn on_timed_out(&self, handler: impl FnOnce() + 'static) {
        if self.timed_out.get() {
            handler();
            return;
        }
        if !self.active() {
            return;
        }
        self.on_timeout.borrow_mut().push(Box::new(handler));
    }

    /// The wrapped primitive.
    pub fn inner(&self) -> &Rc<P> {
        &self.inner
    }

    /// Seconds left on the timeout leg.
    pub fn remaining(&self) -> f64 {
        self.timer.remaining()
    }
}

impl<P: Transient + 'static> Transient for Timed<P> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl Timed<Barrier> {
    pub fn add(&self, member: Rc<dyn Transient>) {
        self.inner.add(member);
    }

    pub fn pending(&self) -> usize {
        self.inner.pending()
    }
}

impl Timed<Trigger> {
    pub fn add(&self, member: Rc<dyn Transient>) {
        self.inner.add(member);
    }

    pub fn pending(&self) -> usize {
        self.inner.pending()
    }
}

impl<T: 'static> Timed<Future<T>> {
    pub fn set(&self, value: T) {
        self.inner.set(value);
    }

    pub fn available(&self) -> bool {
        self.inner.available()
    }

    pub fn try_value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.try_value()
    }

    pub fn value(&self) -> T
    where
        T: Clone + Default,
    {
        self.inner.value()
    }
}
