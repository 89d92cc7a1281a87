use crate::flow::transient::{Lifecycle, Transient};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Internal stepping state shared via [`Rc`]: the lifetime handle
/// plus the running flag and the count of executed steps.
struct StepStateInner {
    lifecycle: Lifecycle,
    running: Cell<bool>,
    steps: Cell<u64>,
}

/// Steppable-object core.
///
/// Cloned into resume/suspend listeners registered on other
/// transients, so a dependency's completion can flip `running`
/// without holding the generator itself alive.
#[derive(Clone)]
pub struct StepCore {
    state: Rc<StepStateInner>,
}

impl StepCore {
    pub fn new() -> Self {
        Self {
            state: Rc::new(StepStateInner {
                lifecycle: Lifecycle::new(),
                running: Cell::new(true),
                steps: Cell::new(0),
            }),
        }
    }

    #[inline]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.state.lifecycle
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    #[inline]
    pub fn set_running(&self, running: bool) {
        self.state.running.set(running);
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.state.steps.get()
    }

    #[inline]
    pub(crate) fn bump(&self) {
        self.state.steps.set(self.state.steps.get() + 1);
    }
}

impl Default for StepCore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StepCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepCore")
            .field("id", &self.lifecycle().id())
            .field("active", &self.lifecycle().is_active())
            .field("running", &self.is_running())
            .field("steps", &self.steps())
            .finish()
    }
}

/// A transient the scheduler can step.
///
/// Implementors provide [`advance`](Generator::advance): one unit
/// of work, reporting whether work actually happened. The provided
/// [`step`](Generator::step) gates on `active && running` and bumps
/// the step counter only for executed work, so a gated call is a
/// pure no-op.
pub trait Generator: Transient {
    fn step_core(&self) -> &StepCore;

    /// Perform one unit of work. Returns `true` if work executed.
    fn advance(&self) -> bool;

    fn step(&self) {
        let core = self.step_core();
        if !core.lifecycle().is_active() || !core.is_running() {
            return;
        }
        if self.advance() {
            core.bump();
        }
    }
}

/// Suspend/resume protocol, provided for every generator including
/// trait objects.
pub trait GeneratorExt: Generator {
    #[inline]
    fn running(&self) -> bool {
        self.step_core().is_running()
    }

    #[inline]
    fn step_number(&self) -> u64 {
        self.step_core().steps()
    }

    /// Stop being stepped. Idempotent on already-suspended.
    fn suspend(&self) {
        self.step_core().set_running(false);
    }

    /// Start being stepped again. Idempotent on already-running.
    fn resume(&self) {
        self.step_core().set_running(true);
    }

    /// Suspend now and resume when `other` completes. If `other` is
    /// already inactive this is equivalent to `resume` immediately.
    fn resume_after(&self, other: &dyn Transient) {
        self.step_core().set_running(false);
        let core = self.step_core().clone();
        other
            .lifecycle()
            .on_complete(move || core.set_running(true));
    }

    /// The dual: keep running and suspend when `other` completes
    /// (immediately if it already has).
    fn suspend_after(&self, other: &dyn Transient) {
        let core = self.step_core().clone();
        other
            .lifecycle()
            .on_complete(move || core.set_running(false));
    }
}

impl<G: Generator + ?Sized> GeneratorExt for G {}
