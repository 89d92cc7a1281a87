use crate::error::FlowFault;
use crate::flow::generator::{Generator, GeneratorExt, StepCore};
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use crate::log::Log;
use std::cell::RefCell;
use std::rc::Rc;

/// One suspension-point outcome of a coroutine body.
pub enum Step<T> {
    /// Produce a value and keep running.
    Yield(T),
    /// Consume this tick without producing anything.
    Pause,
    /// Suspend until the transient completes (no-op if it already
    /// has).
    Wait(Rc<dyn Transient>),
    /// Record the fault and complete. Failure is an explicit value;
    /// it never unwinds into the scheduler.
    Fail(anyhow::Error),
}

impl<T> Step<T> {
    /// `Step::Wait` from a concrete flow handle, sparing the caller
    /// the unsizing cast.
    pub fn wait(dep: Rc<impl Transient + 'static>) -> Self {
        let dep: Rc<dyn Transient> = dep;
        Step::Wait(dep)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Step<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Yield(v) => f.debug_tuple("Yield").field(v).finish(),
            Step::Pause => write!(f, "Pause"),
            Step::Wait(dep) => f.debug_tuple("Wait").field(&dep.lifecycle().id()).finish(),
            Step::Fail(e) => f.debug_tuple("Fail").field(e).finish(),
        }
    }
}

type StepIter<T> = Box<dyn Iterator<Item = Step<T>>>;

enum Body<T> {
    /// Producer not yet instantiated.
    Pending(Box<dyn FnOnce() -> StepIter<T>>),
    Running(StepIter<T>),
    Drained,
}

enum Pulled<T> {
    Step(Step<T>),
    Exhausted,
    Dead,
}

/// Drives a user-supplied lazy step sequence, one element per tick.
///
/// The first step instantiates the iterator and pulls the first
/// element; exhaustion completes the coroutine. Yielding a transient
/// suspends the coroutine until that transient completes. While
/// suspended, kernel steps are pure no-ops and the step counter
/// stands still.
pub struct Coroutine<T: 'static> {
    core: StepCore,
    body: RefCell<Body<T>>,
    value: RefCell<Option<T>>,
    awaiting: RefCell<Option<Rc<dyn Transient>>>,
    fault: RefCell<Option<FlowFault>>,
    log: Log,
}

impl<T: 'static> Coroutine<T> {
    pub(crate) fn new<I, F>(log: Log, producer: F) -> Rc<Self>
    where
        I: IntoIterator<Item = Step<T>>,
        I::IntoIter: 'static,
        F: FnOnce() -> I + 'static,
    {
        Rc::new(Self {
            core: StepCore::new(),
            body: RefCell::new(Body::Pending(Box::new(move || {
                let iter: StepIter<T> = Box::new(producer().into_iter());
                iter
            }))),
            value: RefCell::new(None),
            awaiting: RefCell::new(None),
            fault: RefCell::new(None),
            log,
        })
    }

    /// Last yielded value.
    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// The dependency the coroutine is suspended on, if any.
    pub fn awaiting(&self) -> Option<Rc<dyn Transient>> {
        self.awaiting.borrow().clone()
    }

    /// Whether the body ended with a `Step::Fail`.
    pub fn faulted(&self) -> bool {
        self.fault.borrow().is_some()
    }

    /// Extract the recorded fault for post-mortem inspection.
    pub fn take_fault(&self) -> Option<FlowFault> {
        self.fault.borrow_mut().take()
    }

    fn pull(&self) -> Pulled<T> {
        let mut body = self.body.borrow_mut();
        if matches!(&*body, Body::Pending(_)) {
            if let Body::Pending(producer) = std::mem::replace(&mut *body, Body::Drained) {
                *body = Body::Running(producer());
            }
        }
        match &mut *body {
            Body::Running(iter) => match iter.next() {
                Some(step) => Pulled::Step(step),
                None => {
                    *body = Body::Drained;
                    Pulled::Exhausted
                }
            },
            Body::Drained => Pulled::Dead,
            Body::Pending(_) => unreachable!("producer instantiated above"),
        }
    }
}

impl<T: 'static> Transient for Coroutine<T> {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl<T: 'static> Generator for Coroutine<T> {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    fn advance(&self) -> bool {
        // Running again means any previous dependency resolved.
        self.awaiting.borrow_mut().take();

        match self.pull() {
            Pulled::Dead => false,
            Pulled::Exhausted => {
                self.complete();
                true
            }
            Pulled::Step(Step::Yield(value)) => {
                *self.value.borrow_mut() = Some(value);
                true
            }
            Pulled::Step(Step::Pause) => true,
            Pulled::Step(Step::Wait(dep)) => {
                if dep.active() {
                    self.suspend();
                    let core = self.step_core().clone();
                    dep.lifecycle().on_complete(move || core.set_running(true));
                    *self.awaiting.borrow_mut() = Some(dep);
                }
                true
            }
            Pulled::Step(Step::Fail(source)) => {
                let fault = FlowFault::coroutine(source);
                self.log.error(&format!("coroutine {}: {fault}", self.id()));
                *self.fault.borrow_mut() = Some(fault);
                *self.body.borrow_mut() = Body::Drained;
                self.complete();
                true
            }
        }
    }
}

/// A single producer call wrapped as a generator: the first step
/// invokes it, stores the value (or the fault) and completes. No
/// suspension points.
pub struct Subroutine<T: 'static> {
    core: StepCore,
    call: RefCell<Option<Box<dyn FnOnce() -> anyhow::Result<T>>>>,
    value: RefCell<Option<T>>,
    fault: RefCell<Option<FlowFault>>,
    log: Log,
}

impl<T: 'static> Subroutine<T> {
    pub(crate) fn new<F>(log: Log, call: F) -> Rc<Self>
    where
        F: FnOnce() -> anyhow::Result<T> + 'static,
    {
        Rc::new(Self {
            core: StepCore::new(),
            call: RefCell::new(Some(Box::new(call))),
            value: RefCell::new(None),
            fault: RefCell::new(None),
            log,
        })
    }

    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Whether the call returned `Err`.
    pub fn faulted(&self) -> bool {
        self.fault.borrow().is_some()
    }

    /// Extract the recorded fault for post-mortem inspection.
    pub fn take_fault(&self) -> Option<FlowFault> {
        self.fault.borrow_mut().take()
    }
}

impl<T: 'static> Transient for Subroutine<T> {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl<T: 'static> Generator for Subroutine<T> {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    fn advance(&self) -> bool {
        let Some(call) = self.call.borrow_mut().take() else {
            return false;
        };
        match call() {
            Ok(value) => *self.value.borrow_mut() = Some(value),
            Err(source) => {
                let fault = FlowFault::subroutine(source);
                self.log
                    .error(&format!("subroutine {}: {fault}", self.id()));
                *self.fault.borrow_mut() = Some(fault);
            }
        }
        self.complete();
        true
    }
}
