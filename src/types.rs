use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque handle for a body owned by a [`World`](crate::World).
///
/// Ids are issued by the world and never reused within it, so comparing ids
/// is how the broadphase compares bodies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// Process-unique tag of a world, used to tell worlds apart in events.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorldTag(pub(crate) u64);

/// A body as seen by the broadphase: a center and a bounding circle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    /// Radius of the circle enclosing the body's shape (>= 0).
    pub bounding_radius: f32,
}

impl Body {
    /// Construct a body, rejecting negative or NaN radii.
    ///
    /// Fields are public; a body mutated into non-finite values afterwards is
    /// not re-validated and simply yields NaN bound comparisons.
    pub fn new(position: Vec2, bounding_radius: f32) -> Result<Self> {
        if bounding_radius.is_nan() || bounding_radius < 0.0 {
            return Err(Error::InvalidRadius(bounding_radius));
        }
        Ok(Self {
            position,
            bounding_radius,
        })
    }

    /// Lower end of the body's interval on `axis`.
    pub fn lower_bound(&self, axis: Axis) -> f32 {
        axis.component(self.position) - self.bounding_radius
    }

    /// Upper end of the body's interval on `axis`.
    pub fn upper_bound(&self, axis: Axis) -> f32 {
        axis.component(self.position) + self.bounding_radius
    }
}

/// Coordinate axis the sweep runs along.
///
/// Pick the axis along which bodies are most spread out; see
/// [`Axis::widest_spread`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X = 0,
    Y = 1,
}

impl Axis {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pick this axis' coordinate out of `v`.
    pub fn component(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// The axis with the larger positional variance over `bodies`.
    /// Ties and empty input fall back to [`Axis::X`].
    pub fn widest_spread<'a>(bodies: impl IntoIterator<Item = &'a Body>) -> Axis {
        let mut n = 0.0f32;
        let mut sum = Vec2::ZERO;
        let mut sum_sq = Vec2::ZERO;
        for b in bodies {
            n += 1.0;
            sum += b.position;
            sum_sq += b.position * b.position;
        }
        if n == 0.0 {
            return Axis::X;
        }
        let mean = sum / n;
        let var = sum_sq / n - mean * mean;
        if var.y > var.x { Axis::Y } else { Axis::X }
    }
}

impl TryFrom<usize> for Axis {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        match index {
            0 => Ok(Axis::X),
            1 => Ok(Axis::Y),
            other => Err(Error::InvalidAxis(other)),
        }
    }
}

/// How the tracked list is ordered before each sweep.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    /// Full re-sort every query.
    #[default]
    Full,
    /// Insertion sort over last query's order; cheap when bodies move little
    /// between ticks.
    Insertion,
}

/// Broadphase configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SapConfig {
    /// Axis to sort and sweep along.
    pub axis: Axis,
    pub sort: SortStrategy,
    /// Record wall-clock timings for each query (adds small overhead when true).
    pub enable_timing: bool,
}

/// Lifecycle event discriminator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BodyEventKind {
    Added,
    Removed,
}

/// Emitted synchronously by a world when its body set changes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BodyEvent {
    pub kind: BodyEventKind,
    pub body: BodyId,
    /// World that raised the event.
    pub world: WorldTag,
}

/// A tracked body paired with the state read from the world for one query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisEntry {
    pub id: BodyId,
    pub body: Body,
}

/// Counters for the last completed query.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadphaseStats {
    /// Bodies that took part in the sweep.
    pub tracked: usize,
    /// One-sided interval tests evaluated, including the failing one that ends each scan.
    pub bound_tests: usize,
    /// Bounding-circle tests evaluated.
    pub exact_tests: usize,
    pub candidate_pairs: usize,
}

/// Timing breakdown for the last query.
#[derive(Copy, Clone, Debug, Default)]
pub struct SapTiming {
    pub sort_ms: f64,
    pub sweep_ms: f64,
    pub total_ms: f64,
}

/// View a flat candidate buffer as `(a, b)` tuples.
pub fn iter_pairs(flat: &[BodyId]) -> impl Iterator<Item = (BodyId, BodyId)> + '_ {
    flat.chunks_exact(2).map(|p| (p[0], p[1]))
}
