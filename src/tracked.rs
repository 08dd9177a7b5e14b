//! The list of bodies a broadphase sees, and the handlers that keep it in
//! step with a world.
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::api::BodyEventHandler;
use crate::types::*;

/// Ordered list of tracked body ids, bound to at most one world.
///
/// Owned by the broadphase. Its [`AddBodyHandler`] / [`RemoveBodyHandler`]
/// hold weak references and only act on events from the bound world, so a
/// world stops feeding the list once the broadphase is gone.
#[derive(Debug, Default)]
pub struct TrackedBodies {
    bodies: RefCell<Vec<BodyId>>,
    bound: Cell<Option<WorldTag>>,
}

impl TrackedBodies {
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.bodies.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.borrow().is_empty()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.borrow().contains(&id)
    }

    /// Tracked ids in their current order (sorted as of the last query).
    ///
    /// Drop the guard before mutating the bound world; its handlers need the
    /// list mutably.
    pub fn ids(&self) -> Ref<'_, [BodyId]> {
        Ref::map(self.bodies.borrow(), |v| v.as_slice())
    }

    pub fn bound_world(&self) -> Option<WorldTag> {
        self.bound.get()
    }

    /// Replace the whole list with a copy of `ids` and follow `world` from now on.
    pub(crate) fn rebind(&self, world: WorldTag, ids: &[BodyId]) {
        let mut bodies = self.bodies.borrow_mut();
        bodies.clear();
        bodies.extend_from_slice(ids);
        self.bound.set(Some(world));
    }

    pub(crate) fn unbind(&self) {
        self.bodies.borrow_mut().clear();
        self.bound.set(None);
    }

    pub(crate) fn list_mut(&self) -> RefMut<'_, Vec<BodyId>> {
        self.bodies.borrow_mut()
    }

    fn push(&self, id: BodyId) {
        self.bodies.borrow_mut().push(id);
    }

    /// Remove the first occurrence of `id`; untracked ids are ignored.
    fn remove(&self, id: BodyId) -> bool {
        let mut bodies = self.bodies.borrow_mut();
        match bodies.iter().position(|b| *b == id) {
            Some(idx) => {
                bodies.remove(idx);
                true
            }
            None => false,
        }
    }

    fn is_bound_to(&self, world: WorldTag) -> bool {
        self.bound.get() == Some(world)
    }
}

/// Appends newly added bodies to the tracked list. Sorting waits for the next query.
pub struct AddBodyHandler(pub(crate) Weak<TrackedBodies>);

impl BodyEventHandler for AddBodyHandler {
    fn handle(&self, event: &BodyEvent) {
        let Some(tracked) = self.0.upgrade() else {
            return;
        };
        if event.kind == BodyEventKind::Added && tracked.is_bound_to(event.world) {
            tracked.push(event.body);
        }
    }

    fn is_attached_to(&self, world: WorldTag) -> bool {
        self.0.upgrade().is_some_and(|t| t.is_bound_to(world))
    }
}

/// Drops removed bodies from the tracked list.
pub struct RemoveBodyHandler(pub(crate) Weak<TrackedBodies>);

impl BodyEventHandler for RemoveBodyHandler {
    fn handle(&self, event: &BodyEvent) {
        let Some(tracked) = self.0.upgrade() else {
            return;
        };
        if event.kind == BodyEventKind::Removed && tracked.is_bound_to(event.world) {
            tracked.remove(event.body);
        }
    }

    fn is_attached_to(&self, world: WorldTag) -> bool {
        self.0.upgrade().is_some_and(|t| t.is_bound_to(world))
    }
}
