pub mod footprint;
pub mod polygon;

pub use footprint::Footprint;
pub use polygon::PlanarRegion;

use std::panic::{AssertUnwindSafe, catch_unwind};

use geo::{Area, BooleanOps, MultiPolygon, Rect};
use thiserror::Error;
use tracing::{debug, warn};

use crate::Tolerance;
use crate::geometry::point::Point2d;

/// Failures building or combining planar regions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("ring has only {count} distinct points")]
    TooFewPoints { count: usize },

    #[error("region encloses no area")]
    ZeroArea,

    #[error("ring has non-finite coordinates")]
    NonFinite,

    #[error("ring crosses or touches itself")]
    SelfIntersecting,

    #[error("hole is not inside the outer ring")]
    HoleOutside,

    #[error("holes overlap each other")]
    HolesOverlap,

    #[error("union failed: {reason}")]
    UnionFailed { reason: String },
}

/// Planar-region operations needed to lay out faces without overlap.
///
/// Implement this trait to provide alternative 2-D boolean backends or
/// mock implementations.
pub trait RegionBoolean {
    /// Build a closed region from ordered boundary rings in either winding.
    fn build_region(&self, outer: &[Point2d], holes: &[Vec<Point2d>]) -> Result<PlanarRegion, RegionError>;

    /// Union `region` into `footprint`. On error the footprint is unchanged.
    fn unite(&self, footprint: &mut Footprint, region: &PlanarRegion) -> Result<(), RegionError>;

    /// True when `region` overlaps the footprint by more than a sliver.
    /// Regions touching along an edge or at a vertex do not interfere.
    fn interferes(&self, footprint: &Footprint, region: &PlanarRegion) -> bool;
}

/// Default region engine backed by `geo`'s polygon booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRegionBoolean {
    pub tolerance: Tolerance,
}

impl DefaultRegionBoolean {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    /// Overlap area below which two regions are considered merely touching.
    fn sliver_area(&self, region: &PlanarRegion) -> f64 {
        self.tolerance.coincidence * region.perimeter()
    }
}

impl RegionBoolean for DefaultRegionBoolean {
    fn build_region(&self, outer: &[Point2d], holes: &[Vec<Point2d>]) -> Result<PlanarRegion, RegionError> {
        PlanarRegion::from_rings(outer, holes, &self.tolerance)
    }

    fn unite(&self, footprint: &mut Footprint, region: &PlanarRegion) -> Result<(), RegionError> {
        if footprint.is_empty() {
            *footprint = Footprint::from_region(region);
            return Ok(());
        }
        let addition = MultiPolygon::new(vec![region.polygon().clone()]);
        let merged = catch_unwind(AssertUnwindSafe(|| footprint.shape().union(&addition))).map_err(|_| {
            RegionError::UnionFailed {
                reason: "polygon boolean panicked".into(),
            }
        })?;

        let area = merged.unsigned_area();
        let floor = footprint.area().max(region.area()) - self.sliver_area(region);
        if merged.0.is_empty() || !area.is_finite() || area < floor {
            return Err(RegionError::UnionFailed {
                reason: format!("merged area {area} below input area {floor}"),
            });
        }
        footprint.replace(merged);
        debug!(area, polygons = footprint.shape().0.len(), "footprint grown");
        Ok(())
    }

    fn interferes(&self, footprint: &Footprint, region: &PlanarRegion) -> bool {
        let Some(bounds) = footprint.bounds() else {
            return false;
        };
        let slack = self.tolerance.coincidence;
        if !rects_overlap(&bounds, &region.bounds(), slack) {
            return false;
        }
        let candidate = MultiPolygon::new(vec![region.polygon().clone()]);
        match catch_unwind(AssertUnwindSafe(|| footprint.shape().intersection(&candidate))) {
            Ok(overlap) => overlap.unsigned_area() > self.sliver_area(region),
            Err(_) => {
                warn!("polygon intersection panicked; treating candidate as interfering");
                true
            }
        }
    }
}

/// Rectangles overlap by more than `slack` in both axes.
fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>, slack: f64) -> bool {
    a.min().x < b.max().x - slack
        && b.min().x < a.max().x - slack
        && a.min().y < b.max().y - slack
        && b.min().y < a.max().y - slack
}
