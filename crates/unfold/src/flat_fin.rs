use unfold_kernel::geometry::point::{Point2d, Point3d};
use unfold_kernel::geometry::transform::Transform;
use unfold_kernel::{EdgeId, EntityStore, FaceId, HalfEdgeId, TopologyError};

/// Segments used to flatten a curved edge.
pub const ARC_SEGMENTS: usize = 16;

/// One oriented boundary segment of a flattened face.
///
/// Only source (3-D) geometry is stored; layout positions are derived from
/// the owning face's transform, so they can never go stale.
#[derive(Debug, Clone)]
pub struct FlatFin {
    pub half_edge: HalfEdgeId,
    pub edge: EdgeId,
    /// Endpoints in the fin's own traversal direction.
    pub source_start: Point3d,
    pub source_end: Point3d,
    /// Interior points of a curved edge, in traversal order.
    pub samples: Vec<Point3d>,
    pub length: f64,
    /// The face across this fin in the source shell; `None` on a laminar edge.
    pub neighbor: Option<FaceId>,
    /// Whether the loop runs with the edge's canonical direction.
    pub forward: bool,
    pub(crate) is_internal: bool,
}

impl FlatFin {
    pub(crate) fn new(store: &EntityStore, face: FaceId, half_edge: HalfEdgeId) -> Result<Self, TopologyError> {
        let he = &store.half_edges[half_edge];
        Ok(Self {
            half_edge,
            edge: he.edge,
            source_start: store.half_edge_start(half_edge),
            source_end: store.half_edge_end(half_edge),
            samples: store.half_edge_samples(half_edge, ARC_SEGMENTS),
            length: store.edge_length(he.edge),
            neighbor: store.adjacent_face(face, he.edge)?,
            forward: he.forward,
            is_internal: false,
        })
    }

    /// True once both faces of this edge sit in the same island, joined here.
    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    pub fn is_laminar(&self) -> bool {
        self.neighbor.is_none()
    }

    pub fn start(&self, transform: &Transform) -> Point2d {
        transform.transform_point(&self.source_start).to_point2d()
    }

    pub fn end(&self, transform: &Transform) -> Point2d {
        transform.transform_point(&self.source_end).to_point2d()
    }

    /// Start point and curve samples, i.e. this fin's share of its loop's ring.
    pub fn ring_points(&self) -> impl Iterator<Item = &Point3d> {
        std::iter::once(&self.source_start).chain(self.samples.iter())
    }
}
