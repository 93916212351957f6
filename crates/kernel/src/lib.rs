pub mod geometry;
pub mod region;
pub mod topology;

// Re-export key types at crate root for convenience.
pub use region::{DefaultRegionBoolean, Footprint, PlanarRegion, RegionBoolean, RegionError};
pub use topology::brep::{EdgeId, EntityStore, FaceId, HalfEdgeId, LoopId, ShellId, TopologyError, VertexId};
pub use topology::builder::{BuildError, ShellBuilder};

use serde::{Deserialize, Serialize};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Points closer than this are considered coincident (model units).
    pub coincidence: f64,
    /// Angles smaller than this (radians) are considered zero.
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-10,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &geometry::point::Point3d, b: &geometry::point::Point3d) -> bool {
        a.distance_to(b) < self.coincidence
    }

    /// Both tolerances finite, the coincidence step strictly positive.
    pub fn is_valid(&self) -> bool {
        self.coincidence.is_finite() && self.coincidence > 0.0 && self.angular.is_finite() && self.angular >= 0.0
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    /// Quantize a length onto the coincidence grid so that lengths equal
    /// within tolerance compare equal as integers.
    pub fn length_key(&self, length: f64) -> i64 {
        (length / self.coincidence).round() as i64
    }
}

/// Default tolerance shared by the builders and the region engine.
pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
