//! Sweep-and-prune along a single axis.
//!
//! Each query sorts the tracked bodies by the lower end of their interval on
//! the configured axis and walks the list once. For body `i` the scan over
//! `j > i` stops at the first body whose lower bound is not below `i`'s upper
//! bound: the list is sorted, so every later body starts even further out.
//! Pairs that survive the interval test are confirmed with a bounding-circle
//! check before they are reported.
use std::cmp::Ordering;
use std::rc::Rc;
use std::time::Instant;

use crate::api::{BodyEventHandler, Broadphase, NarrowphaseApi};
use crate::error::Result;
use crate::narrowphase::Narrowphase;
use crate::tracked::{AddBodyHandler, RemoveBodyHandler, TrackedBodies};
use crate::types::*;
use crate::world::World;

/// Order two bodies by the lower end of their interval on `axis`.
///
/// Uses a total order on floats, so NaN bounds sort to the ends instead of
/// panicking.
pub fn compare_lower_bounds(a: &Body, b: &Body, axis: Axis) -> Ordering {
    a.lower_bound(axis).total_cmp(&b.lower_bound(axis))
}

/// One-sided interval test: does `bj` start before `bi` ends on `axis`?
///
/// Meant for `bj` at or after `bi` in sorted order. Touching intervals do not pass.
pub fn check_bounds(bi: &Body, bj: &Body, axis: Axis) -> bool {
    bj.lower_bound(axis) < bi.upper_bound(axis)
}

/// Sort entries ascending by lower bound. Equal bounds may end up in either order.
pub fn sort_axis_list(entries: &mut [AxisEntry], axis: Axis, strategy: SortStrategy) {
    match strategy {
        SortStrategy::Full => {
            entries.sort_unstable_by(|a, b| compare_lower_bounds(&a.body, &b.body, axis))
        }
        SortStrategy::Insertion => insertion_sort(entries, |a, b| {
            compare_lower_bounds(&a.body, &b.body, axis) == Ordering::Greater
        }),
    }
}

/// Moves each item down until the one before it is not greater. Close to
/// linear on lists that are already nearly sorted.
fn insertion_sort<T>(items: &mut [T], is_greater: impl Fn(&T, &T) -> bool) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && is_greater(&items[j - 1], &items[j]) {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Single-axis sweep-and-prune broadphase.
pub struct SapBroadphase {
    pub cfg: SapConfig,
    tracked: Rc<TrackedBodies>,
    add_handler: Rc<dyn BodyEventHandler>,
    remove_handler: Rc<dyn BodyEventHandler>,

    // Candidate buffer, overwritten on every query.
    result: Vec<BodyId>,
    // Per-query snapshot of tracked bodies, in sweep order.
    entries: Vec<AxisEntry>,

    stats: BroadphaseStats,
    last_timing: Option<SapTiming>,
}

impl SapBroadphase {
    pub fn new(cfg: SapConfig) -> Self {
        let tracked = TrackedBodies::shared();
        Self {
            cfg,
            add_handler: Rc::new(AddBodyHandler(Rc::downgrade(&tracked))),
            remove_handler: Rc::new(RemoveBodyHandler(Rc::downgrade(&tracked))),
            tracked,
            result: Vec::new(),
            entries: Vec::new(),
            stats: BroadphaseStats::default(),
            last_timing: None,
        }
    }

    pub fn axis(&self) -> Axis {
        self.cfg.axis
    }

    pub fn set_axis(&mut self, axis: Axis) {
        self.cfg.axis = axis;
    }

    /// Set the axis from its index (0 = x, 1 = y). Other values are rejected
    /// and leave the current axis in place.
    pub fn set_axis_index(&mut self, index: usize) -> Result<()> {
        self.cfg.axis = Axis::try_from(index)?;
        Ok(())
    }

    /// The tracked body list.
    pub fn tracked(&self) -> &TrackedBodies {
        &self.tracked
    }

    /// Stop following `world`. Clears the tracked list if it was bound to it.
    pub fn unbind(&mut self, world: &mut World) {
        world.off(BodyEventKind::Added, &self.add_handler);
        world.off(BodyEventKind::Removed, &self.remove_handler);
        if self.tracked.bound_world() == Some(world.tag()) {
            self.tracked.unbind();
            log::trace!("sap: unbound from world {:?}", world.tag());
        }
    }

    /// Counters from the last query.
    pub fn stats(&self) -> BroadphaseStats {
        self.stats
    }

    /// Timing breakdown for the last query, when `enable_timing` is set.
    pub fn timing(&self) -> Option<SapTiming> {
        self.last_timing
    }

    /// Copy tracked bodies out of `world` and sort them along the axis.
    /// Writes the sorted order back into the tracked list.
    fn sort(&mut self, world: &World) {
        let axis = self.cfg.axis;
        let mut list = self.tracked.list_mut();
        let mut missing = Vec::new();

        self.entries.clear();
        for &id in list.iter() {
            match world.body(id) {
                Some(body) => self.entries.push(AxisEntry { id, body: *body }),
                None => missing.push(id),
            }
        }
        if !missing.is_empty() {
            log::warn!(
                "sap: {} tracked bodies not found in world {:?}, skipped this query",
                missing.len(),
                world.tag()
            );
        }

        sort_axis_list(&mut self.entries, axis, self.cfg.sort);

        list.clear();
        list.extend(self.entries.iter().map(|e| e.id));
        list.extend(missing);
    }

    fn sweep(&mut self) {
        let axis = self.cfg.axis;
        let Self {
            entries,
            result,
            stats,
            ..
        } = self;

        for (i, bi) in entries.iter().enumerate() {
            for bj in &entries[i + 1..] {
                stats.bound_tests += 1;
                if !check_bounds(&bi.body, &bj.body, axis) {
                    break;
                }
                stats.exact_tests += 1;
                if Narrowphase::bounding_radius_check(&bi.body, &bj.body) {
                    result.push(bi.id);
                    result.push(bj.id);
                }
            }
        }
        stats.tracked = entries.len();
        stats.candidate_pairs = result.len() / 2;
    }
}

impl Default for SapBroadphase {
    fn default() -> Self {
        SapBroadphase::new(SapConfig::default())
    }
}

impl Broadphase for SapBroadphase {
    fn bind(&mut self, world: &mut World) {
        let previous = self.tracked.bound_world();
        // Rebinding the same world must not leave a second pair of handlers behind.
        world.off(BodyEventKind::Added, &self.add_handler);
        world.off(BodyEventKind::Removed, &self.remove_handler);

        // Moving the bound tag detaches the handlers from the previous world;
        // that world drops them on its next dispatch.
        self.tracked.rebind(world.tag(), &world.body_ids());

        world.on(BodyEventKind::Added, self.add_handler.clone());
        world.on(BodyEventKind::Removed, self.remove_handler.clone());
        log::trace!(
            "sap: bound to world {:?} (previous {:?}) tracking {} bodies",
            world.tag(),
            previous,
            self.tracked.len()
        );
    }

    fn get_collision_pairs(&mut self, world: &World) -> &[BodyId] {
        debug_assert!(
            self.tracked
                .bound_world()
                .is_none_or(|tag| tag == world.tag()),
            "SapBroadphase queried with a world it is not bound to"
        );
        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };

        self.result.clear();
        self.stats = BroadphaseStats::default();

        self.sort(world);
        let sort_ms = t_all.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        let t_sweep = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.sweep();
        let sweep_ms = t_sweep.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        self.last_timing = t_all.map(|t| SapTiming {
            sort_ms,
            sweep_ms,
            total_ms: t.elapsed().as_secs_f64() * 1000.0,
        });
        log::trace!(
            "sap: axis={:?} tracked={} bound_tests={} exact_tests={} pairs={}",
            self.cfg.axis,
            self.stats.tracked,
            self.stats.bound_tests,
            self.stats.exact_tests,
            self.stats.candidate_pairs
        );

        &self.result
    }

    fn result(&self) -> &[BodyId] {
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use glam::Vec2;

    fn pairs_of(sap: &SapBroadphase) -> Vec<(BodyId, BodyId)> {
        iter_pairs(sap.result()).collect()
    }

    fn entry(id: u32, x: f32, y: f32, r: f32) -> AxisEntry {
        AxisEntry {
            id: BodyId(id),
            body: Body::new(Vec2::new(x, y), r).unwrap(),
        }
    }

    #[test]
    fn test_three_bodies_on_x() {
        let mut w = World::new();
        let a = w.add_circle(Vec2::new(0.0, 0.0), 1.0).unwrap();
        let b = w.add_circle(Vec2::new(1.5, 0.0), 1.0).unwrap();
        let c = w.add_circle(Vec2::new(5.0, 0.0), 1.0).unwrap();

        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        let flat = sap.get_collision_pairs(&w);
        assert_eq!(flat, &[a, b]);

        // a-c is never tested exactly: the scan for a stops at c.
        let stats = sap.stats();
        assert_eq!(stats.exact_tests, 1);
        assert_eq!(stats.bound_tests, 3);
        assert_eq!(stats.candidate_pairs, 1);
        assert_eq!(stats.tracked, 3);
        assert!(!pairs_of(&sap).contains(&(b, c)));
    }

    #[test]
    fn test_sorted_order_written_back() {
        let mut w = World::new();
        let far = w.add_circle(Vec2::new(10.0, 0.0), 1.0).unwrap();
        let near = w.add_circle(Vec2::new(-10.0, 0.0), 1.0).unwrap();
        let mid = w.add_circle(Vec2::new(0.0, 0.0), 1.0).unwrap();

        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        sap.get_collision_pairs(&w);
        assert_eq!(&*sap.tracked().ids(), &[near, mid, far]);
    }

    #[test]
    fn test_added_body_joins_next_query() {
        let mut w = World::new();
        let a = w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        assert!(sap.get_collision_pairs(&w).is_empty());

        let b = w.add_circle(Vec2::new(0.5, 0.0), 1.0).unwrap();
        assert_eq!(sap.tracked().len(), 2);
        assert_eq!(sap.get_collision_pairs(&w), &[a, b]);
    }

    #[test]
    fn test_removed_body_leaves_next_query() {
        let mut w = World::new();
        let a = w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let b = w.add_circle(Vec2::new(0.5, 0.0), 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        assert_eq!(sap.get_collision_pairs(&w).len(), 2);

        w.remove_body(b);
        assert!(!sap.tracked().contains(b));
        assert!(sap.get_collision_pairs(&w).is_empty());
        assert!(sap.tracked().contains(a));

        // Removing again, or removing something never tracked, changes nothing.
        w.remove_body(b);
        w.remove_body(BodyId(77));
        assert_eq!(sap.tracked().len(), 1);
    }

    #[test]
    fn test_rebind_switches_worlds() {
        let mut wa = World::new();
        let mut wb = World::new();
        wa.add_circle(Vec2::ZERO, 1.0).unwrap();
        wa.add_circle(Vec2::new(0.5, 0.0), 1.0).unwrap();
        let b0 = wb.add_circle(Vec2::new(3.0, 0.0), 1.0).unwrap();

        let mut sap = SapBroadphase::default();
        sap.bind(&mut wa);
        sap.bind(&mut wb);
        assert_eq!(&*sap.tracked().ids(), &[b0]);

        // Events from the old world have no effect and its handlers are gone.
        let stray = wa.add_circle(Vec2::new(3.0, 0.0), 1.0).unwrap();
        assert_eq!(sap.tracked().len(), 1);
        assert_eq!(wa.handler_count(BodyEventKind::Added), 0);
        assert_eq!(wa.handler_count(BodyEventKind::Removed), 0);
        wa.remove_body(stray);

        let b1 = wb.add_circle(Vec2::new(3.5, 0.0), 1.0).unwrap();
        assert_eq!(sap.get_collision_pairs(&wb), &[b0, b1]);
    }

    #[test]
    fn test_rebind_same_world_keeps_one_handler_pair() {
        let mut w = World::new();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        sap.bind(&mut w);
        assert_eq!(w.handler_count(BodyEventKind::Added), 1);
        assert_eq!(w.handler_count(BodyEventKind::Removed), 1);

        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        assert_eq!(sap.tracked().len(), 1);
    }

    #[test]
    fn test_bind_copies_snapshot() {
        let mut w = World::new();
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        // Sorting the tracked list must not reorder or alias the world.
        let c = w.add_circle(Vec2::new(-5.0, 0.0), 1.0).unwrap();
        sap.get_collision_pairs(&w);
        assert_eq!(sap.tracked().ids()[0], c);
        assert_eq!(w.body_ids(), vec![BodyId(0), c]);
    }

    #[test]
    fn test_unbind() {
        let mut w = World::new();
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        sap.unbind(&mut w);
        assert!(sap.tracked().is_empty());
        assert_eq!(w.handler_count(BodyEventKind::Added), 0);
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        assert!(sap.tracked().is_empty());
    }

    #[test]
    fn test_dropped_broadphase_detaches_from_world() {
        let mut w = World::new();
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        {
            let mut sap = SapBroadphase::default();
            sap.bind(&mut w);
            assert_eq!(w.handler_count(BodyEventKind::Added), 1);
        }
        assert_eq!(w.handler_count(BodyEventKind::Added), 0);
        assert_eq!(w.handler_count(BodyEventKind::Removed), 0);

        for i in 0..1000 {
            w.add_circle(Vec2::new(i as f32, 0.0), 1.0).unwrap();
        }
        assert_eq!(w.handler_count(BodyEventKind::Added), 0);
        assert_eq!(w.len(), 1001);
    }

    #[test]
    fn test_unbound_query_is_empty() {
        let mut w = World::new();
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        assert!(sap.get_collision_pairs(&w).is_empty());
    }

    #[test]
    fn test_y_axis() {
        let mut w = World::new();
        let a = w.add_circle(Vec2::new(0.0, 0.0), 1.0).unwrap();
        let b = w.add_circle(Vec2::new(0.0, 1.5), 1.0).unwrap();
        w.add_circle(Vec2::new(0.0, 5.0), 1.0).unwrap();

        let mut sap = SapBroadphase::default();
        sap.set_axis_index(1).unwrap();
        assert_eq!(sap.axis(), Axis::Y);
        sap.bind(&mut w);
        assert_eq!(sap.get_collision_pairs(&w), &[a, b]);
        assert_eq!(sap.stats().exact_tests, 1);
    }

    #[test]
    fn test_invalid_axis_index_keeps_axis() {
        let mut sap = SapBroadphase::default();
        sap.set_axis(Axis::Y);
        assert!(sap.set_axis_index(2).is_err());
        assert_eq!(sap.axis(), Axis::Y);
    }

    #[test]
    fn test_interval_overlap_without_circle_overlap() {
        let mut w = World::new();
        w.add_circle(Vec2::new(0.0, 0.0), 1.0).unwrap();
        w.add_circle(Vec2::new(0.5, 10.0), 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        assert!(sap.get_collision_pairs(&w).is_empty());
        assert_eq!(sap.stats().exact_tests, 1);
    }

    #[test]
    fn test_buffer_cleared_between_queries() {
        let mut w = World::new();
        let a = w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let b = w.add_circle(Vec2::new(1.0, 0.0), 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        assert_eq!(sap.get_collision_pairs(&w).len(), 2);

        w.set_position(b, Vec2::new(50.0, 0.0)).unwrap();
        assert!(sap.get_collision_pairs(&w).is_empty());
        assert!(sap.result().is_empty());

        w.set_position(b, Vec2::new(-1.0, 0.0)).unwrap();
        assert_eq!(sap.get_collision_pairs(&w), &[b, a]);
    }

    #[test]
    fn test_insertion_sort_matches_full_sort() {
        let mut w = World::new();
        for i in 0..20 {
            let x = ((i * 7) % 20) as f32 * 0.8;
            let y = ((i * 3) % 5) as f32;
            w.add_circle(Vec2::new(x, y), 0.6).unwrap();
        }
        let mut full = SapBroadphase::default();
        let mut insertion = SapBroadphase::new(SapConfig {
            sort: SortStrategy::Insertion,
            ..Default::default()
        });
        full.bind(&mut w);
        insertion.bind(&mut w);

        for step in 0..3 {
            for id in w.body_ids() {
                let p = w.body(id).unwrap().position;
                w.set_position(id, p + Vec2::new(0.3 * step as f32, 0.0)).unwrap();
            }
            let mut a: Vec<_> = iter_pairs(full.get_collision_pairs(&w))
                .map(|(x, y)| (x.min(y), x.max(y)))
                .collect();
            let mut b: Vec<_> = iter_pairs(insertion.get_collision_pairs(&w))
                .map(|(x, y)| (x.min(y), x.max(y)))
                .collect();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_nan_body_does_not_panic() {
        let mut w = World::new();
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let bad = w
            .add_body(Body {
                position: Vec2::new(f32::NAN, 0.0),
                bounding_radius: 1.0,
            })
            .unwrap();
        w.add_circle(Vec2::new(0.5, 0.0), 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        let flat = sap.get_collision_pairs(&w).to_vec();
        assert!(!flat.contains(&bad));
        assert_eq!(sap.tracked().len(), 3);
    }

    #[test]
    fn test_timing_only_when_enabled() {
        let mut w = World::new();
        w.add_circle(Vec2::ZERO, 1.0).unwrap();
        let mut sap = SapBroadphase::default();
        sap.bind(&mut w);
        sap.get_collision_pairs(&w);
        assert!(sap.timing().is_none());

        sap.cfg.enable_timing = true;
        sap.get_collision_pairs(&w);
        let t = sap.timing().unwrap();
        assert!(t.total_ms >= t.sort_ms);
    }

    #[test]
    fn test_check_bounds_is_strict() {
        let a = Body::new(Vec2::new(0.0, 0.0), 1.0).unwrap();
        let touching = Body::new(Vec2::new(2.0, 0.0), 1.0).unwrap();
        let inside = Body::new(Vec2::new(1.9, 0.0), 1.0).unwrap();
        assert!(!check_bounds(&a, &touching, Axis::X));
        assert!(check_bounds(&a, &inside, Axis::X));
        assert!(check_bounds(&a, &touching, Axis::Y));
    }

    #[test]
    fn test_sort_axis_list_both_strategies() {
        for strategy in [SortStrategy::Full, SortStrategy::Insertion] {
            let mut entries = vec![
                entry(0, 4.0, 0.0, 1.0),
                entry(1, 0.0, 9.0, 3.0),
                entry(2, 2.0, -1.0, 0.5),
            ];
            sort_axis_list(&mut entries, Axis::X, strategy);
            let ids: Vec<_> = entries.iter().map(|e| e.id.0).collect();
            assert_eq!(ids, vec![1, 2, 0]);

            sort_axis_list(&mut entries, Axis::Y, strategy);
            let ids: Vec<_> = entries.iter().map(|e| e.id.0).collect();
            assert_eq!(ids, vec![2, 0, 1]);
        }
    }

    #[test]
    fn test_compare_lower_bounds() {
        let a = Body::new(Vec2::new(0.0, 0.0), 2.0).unwrap();
        let b = Body::new(Vec2::new(1.0, 0.0), 1.0).unwrap();
        assert_eq!(compare_lower_bounds(&a, &b, Axis::X), Ordering::Less);
        assert_eq!(compare_lower_bounds(&b, &a, Axis::X), Ordering::Greater);
        assert_eq!(compare_lower_bounds(&a, &a, Axis::Y), Ordering::Equal);
    }
}
