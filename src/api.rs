use glam::Vec2;

use crate::types::*;
use crate::world::World;

/// Shared contract for broadphase strategies.
///
/// A broadphase proposes a superset of overlapping body pairs; an exact
/// narrowphase runs only on what it returns.
pub trait Broadphase {
    /// Attach to `world`, replacing whatever was tracked before.
    ///
    /// After this call the broadphase mirrors `world`'s body set and follows
    /// its lifecycle events. Events from a previously bound world are ignored.
    fn bind(&mut self, world: &mut World);

    /// Compute candidate pairs for the current tick.
    ///
    /// The returned slice is flat: entries `2k` and `2k + 1` form one pair
    /// (see [`iter_pairs`]). It borrows the broadphase's internal buffer and
    /// is overwritten by the next call.
    fn get_collision_pairs(&mut self, world: &World) -> &[BodyId];

    /// Candidate buffer from the last query.
    fn result(&self) -> &[BodyId];
}

/// Receiver of a world's body lifecycle events.
///
/// Handlers are registered per [`BodyEventKind`] with [`World::on`] and
/// removed by identity with [`World::off`]. They run synchronously inside the
/// world's mutating call and cannot touch the world.
pub trait BodyEventHandler {
    fn handle(&self, event: &BodyEvent);

    /// Whether this handler still wants events from the world tagged `world`.
    /// Worlds drop registrations that answer `false` before their next dispatch.
    fn is_attached_to(&self, _world: WorldTag) -> bool {
        true
    }
}

/// Exact overlap predicate run on candidates that survive the interval test.
pub trait NarrowphaseApi {
    fn overlap_circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> bool;

    /// Bounding-circle overlap between two bodies (touching counts).
    fn bounding_radius_check(a: &Body, b: &Body) -> bool {
        Self::overlap_circle_circle(a.position, a.bounding_radius, b.position, b.bounding_radius)
    }
}
