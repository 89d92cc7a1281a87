use crate::flow::generator::{Generator, StepCore};
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use crate::utils::Clock;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One-shot timer against the kernel clock.
///
/// Latches its start at construction; each step polls the clock and,
/// once `now - start >= interval`, fires the `elapsed` queue and
/// completes. Completing the timer early (cancellation) never fires
/// `elapsed`.
pub struct Timer {
    core: StepCore,
    clock: Clock,
    start: f64,
    interval: f64,
    elapsed: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Timer {
    pub(crate) fn new(clock: Clock, interval: f64) -> Rc<Self> {
        let start = clock.now();
        Rc::new(Self {
            core: StepCore::new(),
            clock,
            start,
            interval: interval.max(0.0),
            elapsed: RefCell::new(Vec::new()),
        })
    }

    /// Fire-once hook for the crossing. Handlers registered after
    /// completion never run.
    pub fn on_elapsed(&self, handler: impl FnOnce() + 'static) {
        if !self.active() {
            return;
        }
        self.elapsed.borrow_mut().push(Box::new(handler));
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Seconds left until the crossing, floored at zero.
    pub fn remaining(&self) -> f64 {
        (self.start + self.interval - self.clock.now()).max(0.0)
    }
}

impl Transient for Timer {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl Generator for Timer {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    fn advance(&self) -> bool {
        if self.clock.now() - self.start >= self.interval {
            let handlers = self.elapsed.take();
            for handler in handlers {
                handler();
            }
            self.complete();
        }
        true
    }
}

/// Repeating timer. Never self-completes.
///
/// Fires `tick` once per period crossing. A large delta that crosses
/// several periods fires once and catches the rest up on subsequent
/// updates, unless the kernel was configured with
/// `periodic_catch_up`.
pub struct Periodic {
    core: StepCore,
    clock: Clock,
    period: f64,
    next: Cell<f64>,
    ticks: Cell<u64>,
    handlers: RefCell<Vec<Rc<dyn Fn()>>>,
    catch_up: bool,
}

impl Periodic {
    pub(crate) fn new(clock: Clock, period: f64, catch_up: bool) -> Rc<Self> {
        let period = period.max(f64::EPSILON);
        let next = clock.now() + period;
        Rc::new(Self {
            core: StepCore::new(),
            clock,
            period,
            next: Cell::new(next),
            ticks: Cell::new(0),
            handlers: RefCell::new(Vec::new()),
            catch_up,
        })
    }

    /// Recurring hook invoked on every period crossing.
    pub fn on_tick(&self, handler: impl Fn() + 'static) {
        self.handlers.borrow_mut().push(Rc::new(handler));
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.get()
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    fn fire(&self) {
        // Snapshot so a handler registering another handler does not
        // re-enter the borrow.
        let handlers: Vec<Rc<dyn Fn()>> = self.handlers.borrow().iter().cloned().collect();
        for handler in &handlers {
            handler();
        }
        self.ticks.set(self.ticks.get() + 1);
        self.next.set(self.next.get() + self.period);
    }
}

impl Transient for Periodic {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl Generator for Periodic {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    fn advance(&self) -> bool {
        let now = self.clock.now();
        if now >= self.next.get() {
            self.fire();
            if self.catch_up {
                while now >= self.next.get() {
                    self.fire();
                }
            }
        }
        true
    }
}
