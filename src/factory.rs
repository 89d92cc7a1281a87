use crate::flow::{
    Barrier, Coroutine, Future, Group, Node, Periodic, Sequence, Step, Subroutine, Timed,
    TimedBarrier, TimedFuture, TimedTrigger, Timer, Trigger,
};
use crate::log::Log;
use crate::utils::Clock;
use std::rc::Rc;

/// Sole construction surface for flow objects.
///
/// Every transient is born here with its kernel handles (clock, log)
/// already set and `running` normalized to true. Cloning a factory is
/// cheap; all clones build into the same kernel.
#[derive(Clone)]
pub struct Factory {
    clock: Clock,
    log: Log,
    root: Rc<Node>,
    periodic_catch_up: bool,
    max_sequence_skip: usize,
}

impl Factory {
    pub(crate) fn new(
        clock: Clock,
        log: Log,
        root: Rc<Node>,
        periodic_catch_up: bool,
        max_sequence_skip: usize,
    ) -> Self {
        Self {
            clock,
            log,
            root,
            periodic_catch_up,
            max_sequence_skip,
        }
    }

    /// Stepping bag of child generators.
    pub fn node(&self) -> Rc<Node> {
        Node::new(self.log.clone())
    }

    /// Non-stepping lifetime bundle.
    pub fn group(&self) -> Rc<Group> {
        Group::new(self.log.clone())
    }

    /// Children stepped one at a time, in order.
    pub fn sequence(&self) -> Rc<Sequence> {
        Sequence::new(self.max_sequence_skip)
    }

    /// Completes when all members complete.
    pub fn barrier(&self) -> Rc<Barrier> {
        Barrier::new(self.log.clone())
    }

    /// Completes when the first member completes.
    pub fn trigger(&self) -> Rc<Trigger> {
        Trigger::new(self.log.clone())
    }

    /// Single-assignment value slot.
    pub fn future<T: 'static>(&self) -> Rc<Future<T>> {
        Future::new(self.log.clone())
    }

    /// One-shot timer. Schedule it (on the root or any node) to make
    /// it tick.
    pub fn timer(&self, interval_secs: f64) -> Rc<Timer> {
        Timer::new(self.clock.clone(), interval_secs)
    }

    /// Repeating timer. Never self-completes.
    pub fn periodic(&self, period_secs: f64) -> Rc<Periodic> {
        Periodic::new(self.clock.clone(), period_secs, self.periodic_catch_up)
    }

    /// Coroutine over a lazy step sequence; the producer runs on the
    /// first step.
    pub fn coroutine<T, I, F>(&self, producer: F) -> Rc<Coroutine<T>>
    where
        T: 'static,
        I: IntoIterator<Item = Step<T>>,
        I::IntoIter: 'static,
        F: FnOnce() -> I + 'static,
    {
        Coroutine::new(self.log.clone(), producer)
    }

    /// Single producer call: runs on the first step, then completes.
    pub fn subroutine<T, F>(&self, call: F) -> Rc<Subroutine<T>>
    where
        T: 'static,
        F: FnOnce() -> anyhow::Result<T> + 'static,
    {
        Subroutine::new(self.log.clone(), call)
    }

    /// Barrier racing a timeout. The timeout leg is scheduled into
    /// the kernel root here.
    pub fn timed_barrier(&self, timeout_secs: f64) -> Rc<TimedBarrier> {
        Timed::new(self.barrier(), self.deadline(timeout_secs))
    }

    /// Trigger racing a timeout.
    pub fn timed_trigger(&self, timeout_secs: f64) -> Rc<TimedTrigger> {
        Timed::new(self.trigger(), self.deadline(timeout_secs))
    }

    /// Future racing a timeout.
    pub fn timed_future<T: 'static>(&self, timeout_secs: f64) -> Rc<TimedFuture<T>> {
        Timed::new(self.future::<T>(), self.deadline(timeout_secs))
    }

    fn deadline(&self, timeout_secs: f64) -> Rc<Timer> {
        let timer = self.timer(timeout_secs);
        self.root.add(timer.clone());
        timer
    }
}
