use tracing::{info, instrument};

use super::brep::*;
use super::builder::{BuildError, ShellBuilder};
use crate::geometry::point::Point3d;

/// Outward counter-clockwise loops of the six box faces over the corner
/// indices 0..8 (bit 0 = x, bit 1 = y, bit 2 = z, via `box_corners`).
/// The top face comes last so an open box can drop it.
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1], // bottom (z = z0)
    [0, 1, 5, 4], // front  (y = y0)
    [1, 2, 6, 5], // right  (x = x1)
    [2, 3, 7, 6], // back   (y = y1)
    [3, 0, 4, 7], // left   (x = x0)
    [4, 5, 6, 7], // top    (z = z1)
];

fn box_corners(x0: f64, y0: f64, z0: f64, x1: f64, y1: f64, z1: f64) -> [Point3d; 8] {
    [
        Point3d::new(x0, y0, z0),
        Point3d::new(x1, y0, z0),
        Point3d::new(x1, y1, z0),
        Point3d::new(x0, y1, z0),
        Point3d::new(x0, y0, z1),
        Point3d::new(x1, y0, z1),
        Point3d::new(x1, y1, z1),
        Point3d::new(x0, y1, z1),
    ]
}

fn build_box(store: &mut EntityStore, corners: [Point3d; 8], faces: &[[usize; 4]]) -> Result<ShellId, BuildError> {
    let mut builder = ShellBuilder::new(store);
    let v = builder.add_vertices(&corners);
    for face in faces {
        builder.add_face(&face.map(|i| v[i]))?;
    }
    Ok(builder.finish())
}

/// Build a closed box shell directly from corner coordinates.
/// The box is axis-aligned with one corner at (x0,y0,z0) and opposite at (x1,y1,z1).
#[instrument(skip(store))]
pub fn make_box(
    store: &mut EntityStore,
    x0: f64,
    y0: f64,
    z0: f64,
    x1: f64,
    y1: f64,
    z1: f64,
) -> Result<ShellId, BuildError> {
    info!(
        min = ?[x0, y0, z0],
        max = ?[x1, y1, z1],
        "creating box primitive"
    );
    build_box(store, box_corners(x0, y0, z0, x1, y1, z1), &BOX_FACES)
}

/// Build a box with its top face missing: five faces, eight edges shared by
/// two faces and four laminar rim edges.
#[instrument(skip(store))]
pub fn make_open_box(store: &mut EntityStore, width: f64, depth: f64, height: f64) -> Result<ShellId, BuildError> {
    info!(width, depth, height, "creating open box primitive");
    build_box(store, box_corners(0.0, 0.0, 0.0, width, depth, height), &BOX_FACES[..5])
}

/// Build a closed right prism over a regular polygon centred on the Z axis.
#[instrument(skip(store))]
pub fn make_prism(store: &mut EntityStore, sides: usize, radius: f64, height: f64) -> Result<ShellId, BuildError> {
    info!(sides, radius, height, "creating prism primitive");
    if sides < 3 {
        return Err(BuildError::TooFewVertices { count: sides });
    }
    let mut builder = ShellBuilder::new(store);
    let ring = |z: f64| -> Vec<Point3d> {
        (0..sides)
            .map(|k| {
                let angle = std::f64::consts::TAU * k as f64 / sides as f64;
                Point3d::new(radius * angle.cos(), radius * angle.sin(), z)
            })
            .collect()
    };
    let bottom = builder.add_vertices(&ring(0.0));
    let top = builder.add_vertices(&ring(height));

    let reversed: Vec<usize> = bottom.iter().rev().copied().collect();
    builder.add_face(&reversed)?;
    for k in 0..sides {
        let next = (k + 1) % sides;
        builder.add_face(&[bottom[k], bottom[next], top[next], top[k]])?;
    }
    builder.add_face(&top)?;
    Ok(builder.finish())
}
