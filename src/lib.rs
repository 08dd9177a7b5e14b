//! bonk_sap: single-axis sweep-and-prune broadphase for 2D bounding circles

pub mod types;
pub mod error;
pub mod api;
pub mod world;
pub mod tracked;
pub mod narrowphase;
pub mod sap;

pub use crate::types::*;
pub use crate::error::{Error, Result};
pub use crate::api::*;
pub use crate::world::World;
pub use crate::tracked::TrackedBodies;
pub use crate::sap::SapBroadphase;
