use unfold_kernel::geometry::point::{Point2d, Point3d, signed_area};
use unfold_kernel::geometry::transform::Transform;
use unfold_kernel::{EntityStore, FaceId, LoopId, TopologyError};

use crate::flat_fin::FlatFin;

/// An ordered ring of fins bounding one boundary of a flattened face.
#[derive(Debug, Clone)]
pub struct FlatLoop {
    pub source: LoopId,
    pub is_outer: bool,
    pub fins: Vec<FlatFin>,
}

impl FlatLoop {
    pub(crate) fn new(store: &EntityStore, face: FaceId, loop_id: LoopId) -> Result<Self, TopologyError> {
        let source = &store.loops[loop_id];
        let fins = source
            .half_edges
            .iter()
            .map(|&he| FlatFin::new(store, face, he))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: loop_id,
            is_outer: source.is_outer,
            fins,
        })
    }

    /// Boundary ring in source coordinates, curved edges sampled.
    pub fn source_points(&self) -> Vec<Point3d> {
        self.fins.iter().flat_map(|f| f.ring_points().copied()).collect()
    }

    /// Boundary ring in layout coordinates.
    pub fn points(&self, transform: &Transform) -> Vec<Point2d> {
        self.fins
            .iter()
            .flat_map(|f| f.ring_points())
            .map(|p| transform.transform_point(p).to_point2d())
            .collect()
    }

    /// Whether the face material lies to the left of this loop's fins once
    /// laid out with `transform`.
    pub(crate) fn material_on_left(&self, transform: &Transform) -> bool {
        (signed_area(&self.points(transform)) > 0.0) == self.is_outer
    }
}
