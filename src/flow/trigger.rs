use crate::error::FlowFault;
use crate::flow::generator::{Generator, StepCore};
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use crate::log::Log;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Dual of [`Barrier`](crate::flow::Barrier): completes when the
/// *first* member completes. Remaining members are left alone; they
/// keep living independently. Adds after completion are no-ops.
pub struct Trigger {
    core: StepCore,
    members: RefCell<Vec<Rc<dyn Transient>>>,
    weak: Weak<Trigger>,
    log: Log,
}

impl Trigger {
    pub(crate) fn new(log: Log) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            core: StepCore::new(),
            members: RefCell::new(Vec::new()),
            weak: weak.clone(),
            log,
        })
    }

    pub fn add(&self, member: Rc<dyn Transient>) {
        if !self.active() {
            return;
        }
        if !member.active() {
            self.log.warn(
                &FlowFault::invalid_member(format!("trigger dropped {}", member.id())).to_string(),
            );
            return;
        }
        let weak = self.weak.clone();
        member.lifecycle().on_complete(move || {
            if let Some(trigger) = weak.upgrade() {
                trigger.fire();
            }
        });
        self.members.borrow_mut().push(member);
    }

    // First member home wins; survivors' listeners find the trigger
    // inactive and fall through.
    fn fire(&self) {
        if !self.active() {
            return;
        }
        self.members.borrow_mut().clear();
        self.complete();
    }

    /// Members still being raced.
    pub fn pending(&self) -> usize {
        self.members.borrow().len()
    }
}

impl Transient for Trigger {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl Generator for Trigger {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    fn advance(&self) -> bool {
        false
    }
}
