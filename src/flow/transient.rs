use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Internal lifetime state, shared via [`Rc`].
///
/// A transient is active from creation until it completes, exactly
/// once. Completion handlers form a fire-once queue owned by the
/// state: drained and cleared when the active flag drops, so no
/// handler can retain the emitter past emission.
struct LifeState {
    id: Uuid,
    active: Cell<bool>,
    name: RefCell<Option<String>>,
    on_complete: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Single-shot lifetime handle.
///
/// A `Lifecycle` can be cloned cheaply; all clones observe and drive
/// the same active flag. Completion listeners registered across the
/// tree capture a clone of the listening side's `Lifecycle`, never
/// the emitting object itself.
#[derive(Clone)]
pub struct Lifecycle {
    state: Rc<LifeState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Rc::new(LifeState {
                id: Uuid::new_v4(),
                active: Cell::new(true),
                name: RefCell::new(None),
                on_complete: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Identity minted at construction; stable for the whole lifetime.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.state.id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    pub fn name(&self) -> Option<String> {
        self.state.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.state.name.borrow_mut() = Some(name.into());
    }

    /// Flip active to false and drain the handler queue, in
    /// registration order. Idempotent: later calls are no-ops, and a
    /// handler calling back into `complete` sees the flag already
    /// down.
    pub fn complete(&self) {
        if !self.state.active.get() {
            return;
        }
        self.state.active.set(false);
        let handlers = self.state.on_complete.take();
        for handler in handlers {
            handler();
        }
    }

    /// Enqueue a fire-once completion handler. If the transient is
    /// already inactive the handler runs synchronously right here.
    pub fn on_complete(&self, handler: impl FnOnce() + 'static) {
        if !self.state.active.get() {
            handler();
            return;
        }
        self.state.on_complete.borrow_mut().push(Box::new(handler));
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .field("name", &self.name())
            .finish()
    }
}

/// Anything with a single-shot active→inactive lifecycle and a
/// completion signal. Every schedulable object implements this.
pub trait Transient {
    fn lifecycle(&self) -> &Lifecycle;
}

/// Operations shared by every transient, provided over the raw
/// [`Lifecycle`] accessor so trait objects get them too.
pub trait TransientExt: Transient {
    #[inline]
    fn id(&self) -> Uuid {
        self.lifecycle().id()
    }

    #[inline]
    fn active(&self) -> bool {
        self.lifecycle().is_active()
    }

    fn name(&self) -> Option<String> {
        self.lifecycle().name()
    }

    fn set_name(&self, name: impl Into<String>)
    where
        Self: Sized,
    {
        self.lifecycle().set_name(name);
    }

    /// Complete now. Idempotent; the completion signal fires at most
    /// once over the whole lifetime.
    fn complete(&self) {
        self.lifecycle().complete();
    }

    /// Enqueue a one-shot action for completion. Runs immediately if
    /// already inactive.
    fn then(&self, action: impl FnOnce() + 'static)
    where
        Self: Sized,
    {
        self.lifecycle().on_complete(action);
    }

    /// Arrange for `self` to complete once `other` does, or
    /// immediately if `other` is already inactive.
    fn complete_after(&self, other: &dyn Transient) {
        let lifecycle = self.lifecycle().clone();
        other.lifecycle().on_complete(move || lifecycle.complete());
    }
}

impl<T: Transient + ?Sized> TransientExt for T {}

/// Chaining name decorator for factory output:
/// `factory.timer(1.0).named("respawn")`.
pub trait Named {
    fn named(self, name: impl Into<String>) -> Self;
}

impl<T: Transient + ?Sized> Named for Rc<T> {
    fn named(self, name: impl Into<String>) -> Self {
        self.lifecycle().set_name(name);
        self
    }
}
