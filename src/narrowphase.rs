use glam::Vec2;

use crate::api::NarrowphaseApi;

/// Bounding-circle tests used by the broadphase.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn overlap_circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> bool {
        // Squared distances; no sqrt needed for a yes/no answer.
        let dist2 = (c0 - c1).length_squared();
        let rsum = r0 + r1;
        dist2 <= rsum * rsum
    }
}
