use crate::error::FlowFault;
use crate::flow::generator::{Generator, StepCore};
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use crate::log::Log;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// Completes when *all* current members have completed.
///
/// Pure membership bookkeeping: no own step behavior. Each added
/// member gets a fire-once listener that removes it; removing the
/// last one completes the barrier. A barrier created empty stays
/// active until an add-and-completion cycle drains it or someone
/// completes it explicitly.
pub struct Barrier {
    core: StepCore,
    members: RefCell<Vec<Rc<dyn Transient>>>,
    weak: Weak<Barrier>,
    log: Log,
}

impl Barrier {
    pub(crate) fn new(log: Log) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            core: StepCore::new(),
            members: RefCell::new(Vec::new()),
            weak: weak.clone(),
            log,
        })
    }

    /// Add a member to wait on. Already-inactive transients are not
    /// added (logged and dropped); adds after the barrier completed
    /// are no-ops.
    pub fn add(&self, member: Rc<dyn Transient>) {
        if !self.active() {
            return;
        }
        if !member.active() {
            self.log.warn(
                &FlowFault::invalid_member(format!("barrier dropped {}", member.id())).to_string(),
            );
            return;
        }
        let id = member.id();
        let weak = self.weak.clone();
        member.lifecycle().on_complete(move || {
            if let Some(barrier) = weak.upgrade() {
                barrier.settle(id);
            }
        });
        self.members.borrow_mut().push(member);
    }

    fn settle(&self, id: Uuid) {
        let emptied = {
            let mut members = self.members.borrow_mut();
            members.retain(|m| m.id() != id);
            members.is_empty()
        };
        if emptied {
            self.complete();
        }
    }

    /// Members still being waited on.
    pub fn pending(&self) -> usize {
        self.members.borrow().len()
    }
}

impl Transient for Barrier {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl Generator for Barrier {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    fn advance(&self) -> bool {
        false
    }
}
