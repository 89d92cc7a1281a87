use crate::error::FlowFault;
use crate::flow::generator::{Generator, StepCore};
use crate::flow::transient::{Lifecycle, Transient, TransientExt};
use crate::log::Log;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// Unordered-by-contract, ordered-by-insertion bag of child
/// generators, stepped once each per tick.
///
/// A child's completion removes it from the node; membership is the
/// only strong reference the node holds. The node itself never
/// self-completes. The kernel's root is one of these.
pub struct Node {
    core: StepCore,
    children: RefCell<Vec<Rc<dyn Generator>>>,
    weak: Weak<Node>,
    log: Log,
}

impl Node {
    pub(crate) fn new(log: Log) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            core: StepCore::new(),
            children: RefCell::new(Vec::new()),
            weak: weak.clone(),
            log,
        })
    }

    /// Schedule a child. Already-inactive children are dropped with a
    /// log line; live ones deregister themselves at completion.
    pub fn add(&self, child: Rc<dyn Generator>) {
        if !child.active() {
            self.log.warn(
                &FlowFault::invalid_member(format!("node dropped {}", child.id())).to_string(),
            );
            return;
        }
        let id = child.id();
        let weak = self.weak.clone();
        child.lifecycle().on_complete(move || {
            if let Some(node) = weak.upgrade() {
                node.remove(id);
            }
        });
        self.children.borrow_mut().push(child);
    }

    fn remove(&self, id: Uuid) {
        self.children.borrow_mut().retain(|c| c.id() != id);
    }

    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }
}

impl Transient for Node {
    fn lifecycle(&self) -> &Lifecycle {
        self.core.lifecycle()
    }
}

impl Generator for Node {
    fn step_core(&self) -> &StepCore {
        &self.core
    }

    // Snapshot before iterating: completion-driven removal cannot
    // invalidate the traversal, and children added mid-tick wait for
    // the next step.
    fn advance(&self) -> bool {
        let snapshot: Vec<Rc<dyn Generator>> = self.children.borrow().iter().cloned().collect();
        if snapshot.is_empty() {
            return false;
        }
        for child in &snapshot {
            child.step();
        }
        true
    }
}

/// Non-stepping container used solely for lifetime bundling.
///
/// Members remove themselves at completion so the group can be
/// inspected, but completing the group leaves its members alone.
pub struct Group {
    lifecycle: Lifecycle,
    members: RefCell<Vec<Rc<dyn Transient>>>,
    weak: Weak<Group>,
    log: Log,
}

impl Group {
    pub(crate) fn new(log: Log) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            lifecycle: Lifecycle::new(),
            members: RefCell::new(Vec::new()),
            weak: weak.clone(),
            log,
        })
    }

    pub fn add(&self, member: Rc<dyn Transient>) {
        if !member.active() {
            self.log.warn(
                &FlowFault::invalid_member(format!("group dropped {}", member.id())).to_string(),
            );
            return;
        }
        let id = member.id();
        let weak = self.weak.clone();
        member.lifecycle().on_complete(move || {
            if let Some(group) = weak.upgrade() {
                group.members.borrow_mut().retain(|m| m.id() != id);
            }
        });
        self.members.borrow_mut().push(member);
    }

    /// Snapshot of the current members, for iteration or inspection.
    pub fn members(&self) -> Vec<Rc<dyn Transient>> {
        self.members.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }
}

impl Transient for Group {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}
