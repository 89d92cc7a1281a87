use crate::flow::generator::{Generator, StepCore};
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Children stepped one at a time, in order. Completes when the
/// queue drains.
///
/// No completion listeners are installed on children: a completed
/// head is simply popped the next time the sequence steps, and the
/// new head is stepped in the same tick. The pop loop is iterative
/// and bounded by `max_skip` so a long run of already-completed
/// children cannot monopolize a tick.
pub struct Sequence {
    core: StepCore,
    queue: RefCell<VecDeque<Rc<dyn Generator>>>,
    max_skip: usize,
}

enum Head {
    Step(Rc<dyn Generator>),
    Drained,
    SkipBudgetSpent,
}

impl Sequence {
    pub(crate) fn new(max_skip: usize) -> Rc<Self> {
        Rc::new(Self {
            core: StepCore::new(),
            queue: RefCell::new(VecDeque::new()),
            max_skip: max_skip.max(1),
        })
    }

    /// Append a child. Children added mid-run go to the back.
    pub fn add(&self, child: Rc<dyn Generator>) {
        self.queue.borrow_mut().push_back(child);
    }

    /// The head the next step will drive, if any.
    pub fn current(&self) -> Option<Rc<dyn Generator>> {
        self.queue.borrow().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl Transient for Sequence {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl Generator for Sequence {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    fn advance(&self) -> bool {
        // Pop completed heads inside the borrow, step outside it: the
        // head may complete synchronously and its handlers may add to
        // this queue again.
        let head = {
            let mut queue = self.queue.borrow_mut();
            let mut skipped = 0;
            loop {
                match queue.front() {
                    None => break Head::Drained,
                    Some(h) if h.active() => break Head::Step(h.clone()),
                    Some(_) => {
                        queue.pop_front();
                        skipped += 1;
                        if skipped >= self.max_skip {
                            break Head::SkipBudgetSpent;
                        }
                    }
                }
            }
        };

        match head {
            Head::Drained => {
                self.complete();
                false
            }
            Head::Step(h) => {
                h.step();
                true
            }
            // Remaining pops resume next tick.
            Head::SkipBudgetSpent => true,
        }
    }
}
