use glam::Vec2;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::api::BodyEventHandler;
use crate::error::{Error, Result};
use crate::types::*;

fn next_world_tag() -> WorldTag {
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    WorldTag(COUNTER.fetch_add(1, Ordering::Relaxed))
}

struct Registration {
    kind: BodyEventKind,
    handler: Rc<dyn BodyEventHandler>,
}

/// A set of bodies plus the lifecycle events a broadphase listens to.
///
/// Every body added or removed raises a [`BodyEvent`] delivered synchronously,
/// before the mutating call returns.
pub struct World {
    tag: WorldTag,
    bodies: BTreeMap<BodyId, Body>,
    next_id: u32,
    handlers: Vec<Registration>,
}

impl World {
    pub fn new() -> Self {
        Self {
            tag: next_world_tag(),
            bodies: BTreeMap::new(),
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    pub fn tag(&self) -> WorldTag {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Bodies in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> + '_ {
        self.bodies.iter().map(|(id, b)| (*id, b))
    }

    /// Snapshot of the current ids; later mutation of the world does not affect it.
    pub fn body_ids(&self) -> Vec<BodyId> {
        self.bodies.keys().copied().collect()
    }

    /// Insert a body and notify `Added` handlers.
    ///
    /// Ids are never reused, so a world can issue at most `u32::MAX` of them;
    /// after that this returns [`Error::IdsExhausted`] and the world is unchanged.
    pub fn add_body(&mut self, body: Body) -> Result<BodyId> {
        let id = BodyId(self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or(Error::IdsExhausted)?;
        self.bodies.insert(id, body);
        self.emit(BodyEventKind::Added, id);
        Ok(id)
    }

    /// Convenience: validate and insert a circle-bounded body.
    pub fn add_circle(&mut self, position: Vec2, radius: f32) -> Result<BodyId> {
        let body = Body::new(position, radius)?;
        self.add_body(body)
    }

    /// Remove a body and notify `Removed` handlers. Unknown ids raise nothing.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let body = self.bodies.remove(&id)?;
        self.emit(BodyEventKind::Removed, id);
        Some(body)
    }

    pub fn set_position(&mut self, id: BodyId, position: Vec2) -> Result<()> {
        let body = self.bodies.get_mut(&id).ok_or(Error::UnknownBody(id))?;
        body.position = position;
        Ok(())
    }

    pub fn set_radius(&mut self, id: BodyId, radius: f32) -> Result<()> {
        let checked = Body::new(Vec2::ZERO, radius)?;
        let body = self.bodies.get_mut(&id).ok_or(Error::UnknownBody(id))?;
        body.bounding_radius = checked.bounding_radius;
        Ok(())
    }

    /// Register `handler` for events of `kind`.
    pub fn on(&mut self, kind: BodyEventKind, handler: Rc<dyn BodyEventHandler>) {
        self.handlers.push(Registration { kind, handler });
    }

    /// Unregister `handler` from `kind`, comparing by identity.
    /// Returns whether a registration was removed.
    pub fn off(&mut self, kind: BodyEventKind, handler: &Rc<dyn BodyEventHandler>) -> bool {
        let before = self.handlers.len();
        self.handlers
            .retain(|r| !(r.kind == kind && Rc::ptr_eq(&r.handler, handler)));
        before != self.handlers.len()
    }

    /// Number of live registrations for `kind`.
    pub fn handler_count(&self, kind: BodyEventKind) -> usize {
        self.handlers
            .iter()
            .filter(|r| r.kind == kind && r.handler.is_attached_to(self.tag))
            .count()
    }

    fn emit(&mut self, kind: BodyEventKind, body: BodyId) {
        let tag = self.tag;
        self.handlers.retain(|r| r.handler.is_attached_to(tag));
        let event = BodyEvent { kind, body, world: tag };
        for r in self.handlers.iter().filter(|r| r.kind == kind) {
            r.handler.handle(&event);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}
