use unfold_kernel::geometry::point::{Point2d, Point3d};
use unfold_kernel::geometry::transform::{BoundingBox, Frame, Transform};
use unfold_kernel::geometry::vector::Vec3;
use unfold_kernel::{EdgeId, EntityStore, FaceId, PlanarRegion, Tolerance};

use crate::error::PlacementError;
use crate::flat_fin::FlatFin;
use crate::flat_loop::FlatLoop;

/// A source face together with the rigid transform that lays it in the
/// layout plane.
#[derive(Debug, Clone)]
pub struct FlatFace {
    pub source: FaceId,
    /// Index of the island holding this face.
    pub body: usize,
    /// Creation order across the whole run; lower ranks are closer to a seed.
    pub rank: u64,
    transform: Transform,
    normal: Vec3,
    flipped: bool,
    loops: Vec<FlatLoop>,
}

impl FlatFace {
    fn load(store: &EntityStore, face: FaceId, body: usize, rank: u64) -> Result<Self, PlacementError> {
        let normal = store.face_normal(face).ok_or(PlacementError::NonPlanar(face))?;
        let loops = store
            .face_loops(face)
            .map(|l| FlatLoop::new(store, face, l))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: face,
            body,
            rank,
            transform: Transform::identity(),
            normal,
            flipped: false,
            loops,
        })
    }

    /// Lay a face at the layout origin, its first usable outer edge along +X
    /// and its outward normal facing -Z.
    pub(crate) fn seed(
        store: &EntityStore,
        face: FaceId,
        body: usize,
        rank: u64,
        tolerance: &Tolerance,
    ) -> Result<Self, PlacementError> {
        let mut flat = Self::load(store, face, body, rank)?;
        let from = flat.loops[0]
            .fins
            .iter()
            .filter(|f| !tolerance.is_zero_length(f.source_start.distance_to(&f.source_end)))
            .find_map(|f| Frame::from_x_and_normal(f.source_start, f.source_end - f.source_start, flat.normal))
            .ok_or(PlacementError::NoAnchor(face))?;
        flat.transform = Transform::frame_to_frame(&from, &Frame::world_flipped());
        Ok(flat)
    }

    /// Lay `face` against the placed fin `base.loops[at.0].fins[at.1]`: the
    /// shared edge maps exactly onto the base fin's layout copy and the new
    /// face lands on the opposite side of it.
    ///
    /// Returns the face and the position of its own fin on the shared edge.
    pub(crate) fn across(
        store: &EntityStore,
        face: FaceId,
        body: usize,
        rank: u64,
        base: &FlatFace,
        at: (usize, usize),
        tolerance: &Tolerance,
    ) -> Result<(Self, (usize, usize)), PlacementError> {
        let base_loop = &base.loops[at.0];
        let base_fin = &base_loop.fins[at.1];
        let edge = base_fin.edge;

        let mut flat = Self::load(store, face, body, rank)?;
        let position = flat
            .fin_for_edge(edge)
            .ok_or(PlacementError::UnmatchedEdge { face, edge })?;

        if tolerance.is_zero_length(base_fin.source_start.distance_to(&base_fin.source_end)) {
            return Err(PlacementError::DegenerateEdge(edge));
        }
        let from = Frame::from_x_and_normal(
            base_fin.source_start,
            base_fin.source_end - base_fin.source_start,
            flat.normal,
        )
        .ok_or(PlacementError::DegenerateEdge(edge))?;

        let start = base_fin.start(&base.transform).to_point3d();
        let end = base_fin.end(&base.transform).to_point3d();
        let onto = |z: Vec3| Frame::from_x_and_normal(start, end - start, z).ok_or(PlacementError::DegenerateEdge(edge));
        flat.transform = Transform::frame_to_frame(&from, &onto(-Vec3::Z)?);

        // Material sides relative to the layout direction start -> end.
        let base_left = base_loop.material_on_left(&base.transform);
        let own = &flat.loops[position.0];
        let same_direction = own.fins[position.1].forward == base_fin.forward;
        let own_left = own.material_on_left(&flat.transform) == same_direction;
        if own_left == base_left {
            flat.transform = Transform::frame_to_frame(&from, &onto(Vec3::Z)?);
            flat.flipped = true;
        }
        Ok((flat, position))
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Outward normal of the source face.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Laid back side up, because its loops disagree in orientation with the
    /// neighbour it was unfolded from.
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn loops(&self) -> &[FlatLoop] {
        &self.loops
    }

    pub(crate) fn loops_mut(&mut self) -> &mut [FlatLoop] {
        &mut self.loops
    }

    /// All fins with their (loop, fin) positions.
    pub fn fins(&self) -> impl Iterator<Item = ((usize, usize), &FlatFin)> {
        self.loops
            .iter()
            .enumerate()
            .flat_map(|(li, l)| l.fins.iter().enumerate().map(move |(fi, f)| ((li, fi), f)))
    }

    /// First fin lying on `edge`.
    pub fn fin_for_edge(&self, edge: EdgeId) -> Option<(usize, usize)> {
        self.fins().find(|(_, f)| f.edge == edge).map(|(pos, _)| pos)
    }

    pub fn outer_ring(&self) -> Vec<Point2d> {
        self.loops[0].points(&self.transform)
    }

    pub fn hole_rings(&self) -> Vec<Vec<Point2d>> {
        self.loops[1..].iter().map(|l| l.points(&self.transform)).collect()
    }

    /// Layout position of a point on the source face's plane; `None` when
    /// the point is off that plane.
    pub fn to_layout(&self, point: &Point3d, tolerance: &Tolerance) -> Option<Point2d> {
        let mapped = self.transform.transform_point(point);
        tolerance.is_zero_length(mapped.z).then(|| mapped.to_point2d())
    }

    /// On the face's plane and within its boundary, holes excluded.
    pub fn contains_point(&self, point: &Point3d, tolerance: &Tolerance) -> bool {
        self.to_layout(point, tolerance).is_some_and(|p| {
            PlanarRegion::from_rings(&self.outer_ring(), &self.hole_rings(), tolerance)
                .is_ok_and(|region| region.covers(&p, tolerance.coincidence))
        })
    }

    /// Layout bounds (z is zero).
    pub fn bounding_box(&self) -> BoundingBox {
        let points: Vec<_> = self.outer_ring().iter().map(|p| p.to_point3d()).collect();
        BoundingBox::from_points(&points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use unfold_kernel::ShellBuilder;

    /// Two unit squares folded at 90 degrees along the x axis.
    fn hinge(flip_second: bool) -> (EntityStore, FaceId, FaceId) {
        let mut store = EntityStore::new();
        let mut b = ShellBuilder::new(&mut store);
        let v = b.add_vertices(&[
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(1.0, 0.0, 1.0),
        ]);
        let floor = b.add_face(&[v[0], v[3], v[2], v[1]]).unwrap();
        let wall = if flip_second {
            b.add_face(&[v[0], v[4], v[5], v[1]]).unwrap()
        } else {
            b.add_face(&[v[0], v[1], v[5], v[4]]).unwrap()
        };
        b.finish();
        (store, floor, wall)
    }

    fn area(ring: &[Point2d]) -> f64 {
        unfold_kernel::geometry::point::signed_area(ring)
    }

    #[test]
    fn test_seed_lies_in_layout_plane() {
        let (store, floor, _) = hinge(false);
        let tol = Tolerance::default();
        let flat = FlatFace::seed(&store, floor, 0, 0, &tol).unwrap();
        let ring = flat.outer_ring();
        assert_eq!(ring.len(), 4);
        assert_abs_diff_eq!(area(&ring).abs(), 1.0, epsilon = 1e-12);
        for p in flat.loops()[0].source_points() {
            let mapped = flat.transform().transform_point(&p);
            assert_abs_diff_eq!(mapped.z, 0.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(ring[0].x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ring[0].y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_across_shares_edge_and_opposite_side() {
        let (store, floor, wall) = hinge(false);
        let tol = Tolerance::default();
        let base = FlatFace::seed(&store, floor, 0, 0, &tol).unwrap();
        let at = base
            .fins()
            .find(|(_, f)| f.neighbor == Some(wall))
            .map(|(pos, _)| pos)
            .unwrap();
        let (flat, pos) = FlatFace::across(&store, wall, 0, 1, &base, at, &tol).unwrap();
        assert!(!flat.is_flipped());

        let base_fin = &base.loops()[at.0].fins[at.1];
        let own_fin = &flat.loops()[pos.0].fins[pos.1];
        assert_eq!(base_fin.edge, own_fin.edge);
        // Opposite traversal: own start meets base end.
        let d = own_fin.start(flat.transform()).distance_to(&base_fin.end(base.transform()));
        assert!(d < 1e-12);

        // The two unit squares together cover twice the area of either.
        let b0 = base.bounding_box();
        let b1 = flat.bounding_box();
        let union = b0.union(&b1);
        assert_abs_diff_eq!(union.size().x * union.size().y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inconsistent_winding_is_flipped() {
        let (store, floor, wall) = hinge(true);
        let tol = Tolerance::default();
        let base = FlatFace::seed(&store, floor, 0, 0, &tol).unwrap();
        let at = base
            .fins()
            .find(|(_, f)| f.neighbor == Some(wall))
            .map(|(pos, _)| pos)
            .unwrap();
        let (flat, _) = FlatFace::across(&store, wall, 0, 1, &base, at, &tol).unwrap();
        assert!(flat.is_flipped());
        assert!(flat.transform().is_isometry(1e-12));
        let union = base.bounding_box().union(&flat.bounding_box());
        assert_abs_diff_eq!(union.size().x * union.size().y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_curved_face_cannot_be_loaded() {
        use unfold_kernel::geometry::surfaces::{Sphere, Surface};
        let mut store = EntityStore::new();
        let mut b = ShellBuilder::new(&mut store);
        let v = b.add_vertices(&[
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
        ]);
        let face = b
            .add_face_on_surface(&v, Surface::Sphere(Sphere::new(Point3d::ORIGIN, 1.0)), true)
            .unwrap();
        b.finish();
        let err = FlatFace::seed(&store, face, 0, 0, &Tolerance::default()).unwrap_err();
        assert_eq!(err, PlacementError::NonPlanar(face));
    }
}
