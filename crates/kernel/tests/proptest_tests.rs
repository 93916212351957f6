//! Property-based tests for kernel invariants the unfolder relies on.

use proptest::prelude::*;

use unfold_kernel::geometry::point::{Point2d, Point3d};
use unfold_kernel::geometry::transform::{Frame, Transform};
use unfold_kernel::geometry::vector::Vec3;
use unfold_kernel::topology::primitives::{make_box, make_prism};
use unfold_kernel::{DefaultRegionBoolean, EntityStore, Footprint, RegionBoolean};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Arbitrary 3D coordinate tuple in a reasonable floating-point range.
fn arb_point() -> impl Strategy<Value = (f64, f64, f64)> {
    (-1000.0f64..1000.0, -1000.0f64..1000.0, -1000.0f64..1000.0)
}

/// Arbitrary direction that stays well away from zero length.
fn arb_direction() -> impl Strategy<Value = Vec3> {
    (-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0)
        .prop_filter("direction too short", |(x, y, z)| x * x + y * y + z * z > 0.01)
        .prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

/// Arbitrary positive dimension suitable for box extents (avoids degenerate zero-size).
fn arb_positive_dim() -> impl Strategy<Value = f64> {
    0.1f64..1000.0
}

/// Arbitrary rotation angle in radians.
fn arb_angle() -> impl Strategy<Value = f64> {
    -std::f64::consts::PI..std::f64::consts::PI
}

const TOL: f64 = 1e-6;

fn point((x, y, z): (f64, f64, f64)) -> Point3d {
    Point3d::new(x, y, z)
}

// ---------------------------------------------------------------------------
// 1. Frame-to-frame mapping is an isometry: d(M*a, M*b) == d(a, b)
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn frame_to_frame_preserves_distance(
        o in arb_point(),
        x_dir in arb_direction(),
        normal in arb_direction(),
        a in arb_point(),
        b in arb_point(),
    ) {
        prop_assume!(!x_dir.is_parallel_to(&normal, 0.1));
        let from = Frame::from_x_and_normal(point(o), x_dir, normal).unwrap();
        let map = Transform::frame_to_frame(&from, &Frame::world_flipped());
        let (a, b) = (point(a), point(b));
        let d = a.distance_to(&b);
        let mapped = map.transform_point(&a).distance_to(&map.transform_point(&b));
        prop_assert!((d - mapped).abs() < TOL * d.max(1.0),
            "distance {} became {}", d, mapped);
        prop_assert!(map.is_isometry(1e-9));
    }
}

// ---------------------------------------------------------------------------
// 2. A frame's normal lands on the target frame's z axis
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn frame_to_frame_maps_normal_to_layout_axis(
        o in arb_point(),
        x_dir in arb_direction(),
        normal in arb_direction(),
    ) {
        prop_assume!(!x_dir.is_parallel_to(&normal, 0.1));
        let from = Frame::from_x_and_normal(point(o), x_dir, normal).unwrap();
        let map = Transform::frame_to_frame(&from, &Frame::world_flipped());
        let n = map.transform_vector(&from.z_axis);
        prop_assert!((n.z + 1.0).abs() < 1e-9, "normal mapped to {:?}", n);
        let origin = map.transform_point(&from.origin);
        prop_assert!(origin.distance_to(&Point3d::ORIGIN) < TOL);
    }
}

// ---------------------------------------------------------------------------
// 3. Rigid transform inverse roundtrip: T^{-1}(T(p)) == p
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn transform_inverse_roundtrip(
        axis in arb_direction(),
        angle in arb_angle(),
        t in arb_point(),
        p in arb_point(),
    ) {
        let rotation = Transform::rotation_axis_angle(axis, angle).unwrap();
        let tr = Transform::translation(t.0, t.1, t.2).then(&rotation);
        let inv = tr.inverse().unwrap();
        let p = point(p);
        let back = inv.transform_point(&tr.transform_point(&p));
        prop_assert!(back.distance_to(&p) < TOL, "roundtrip drifted to {:?}", back);
    }
}

// ---------------------------------------------------------------------------
// 4. Box Euler formula: for any valid box dimensions, V - E + F = 2
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn box_euler_formula(
        w in arb_positive_dim(),
        h in arb_positive_dim(),
        d in arb_positive_dim(),
    ) {
        let mut store = EntityStore::new();
        let shell = make_box(&mut store, 0.0, 0.0, 0.0, w, h, d).unwrap();
        let (v, e, f) = store.count_topology(shell).unwrap();
        prop_assert_eq!(v as i64 - e as i64 + f as i64, 2);
    }
}

// ---------------------------------------------------------------------------
// 5. Every prism edge has exactly one face on each side
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prism_edges_are_two_faced(
        sides in 3usize..24,
        radius in 0.5f64..50.0,
        height in 0.5f64..50.0,
    ) {
        let mut store = EntityStore::new();
        let shell = make_prism(&mut store, sides, radius, height).unwrap();
        for edge in store.shell_edges(shell).unwrap() {
            for face in store.edge_faces(edge) {
                let other = store.adjacent_face(face, edge).unwrap();
                prop_assert!(other.is_some() && other != Some(face));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 6. Footprint area never shrinks as disjoint strips are united
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn footprint_area_is_monotonic(widths in prop::collection::vec(0.1f64..10.0, 1..8)) {
        let engine = DefaultRegionBoolean::default();
        let mut footprint = Footprint::new();
        let mut x = 0.0;
        let mut previous = 0.0;
        for w in widths {
            let strip = [
                Point2d::new(x, 0.0),
                Point2d::new(x + w, 0.0),
                Point2d::new(x + w, 1.0),
                Point2d::new(x, 1.0),
            ];
            let region = engine.build_region(&strip, &[]).unwrap();
            prop_assert!(!engine.interferes(&footprint, &region));
            engine.unite(&mut footprint, &region).unwrap();
            prop_assert!(footprint.area() >= previous);
            previous = footprint.area();
            x += w;
        }
        prop_assert!((footprint.area() - x).abs() < 1e-6 * x.max(1.0));
    }
}
