use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// A 4x4 affine transformation matrix stored in column-major order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Column-major 4x4 matrix entries.
    pub m: [f64; 16],
}

impl Transform {
    pub fn identity() -> Self {
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            dx,  dy,  dz,  1.0,
        ];
        Self { m }
    }

    /// Rotation around the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        #[rustfmt::skip]
        let m = [
            c,   s,   0.0, 0.0,
            -s,  c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    /// Rotation around an arbitrary axis by `angle` radians (Rodrigues' formula).
    /// Returns `None` for a zero axis.
    pub fn rotation_axis_angle(axis: Vec3, angle: f64) -> Option<Self> {
        let axis = axis.normalized()?;
        let c = angle.cos();
        let s = angle.sin();
        let t = 1.0 - c;
        let (x, y, z) = (axis.x, axis.y, axis.z);

        #[rustfmt::skip]
        let m = [
            t*x*x + c,     t*x*y + s*z,   t*x*z - s*y,   0.0,
            t*x*y - s*z,   t*y*y + c,     t*y*z + s*x,   0.0,
            t*x*z + s*y,   t*y*z - s*x,   t*z*z + c,     0.0,
            0.0,           0.0,           0.0,           1.0,
        ];
        Some(Self { m })
    }

    /// Build from three basis columns and a translation column.
    fn from_columns(x: Vec3, y: Vec3, z: Vec3, t: Vec3) -> Self {
        #[rustfmt::skip]
        let m = [
            x.x, x.y, x.z, 0.0,
            y.x, y.y, y.z, 0.0,
            z.x, z.y, z.z, 0.0,
            t.x, t.y, t.z, 1.0,
        ];
        Self { m }
    }

    /// Matrix element access (row, col), 0-indexed.
    fn at(&self, row: usize, col: usize) -> f64 {
        self.m[col * 4 + row]
    }

    fn column(&self, col: usize) -> Vec3 {
        Vec3::new(self.at(0, col), self.at(1, col), self.at(2, col))
    }

    /// Transform a point (applies translation).
    pub fn transform_point(&self, p: &Point3d) -> Point3d {
        let x = self.at(0, 0) * p.x + self.at(0, 1) * p.y + self.at(0, 2) * p.z + self.at(0, 3);
        let y = self.at(1, 0) * p.x + self.at(1, 1) * p.y + self.at(1, 2) * p.z + self.at(1, 3);
        let z = self.at(2, 0) * p.x + self.at(2, 1) * p.y + self.at(2, 2) * p.z + self.at(2, 3);
        Point3d::new(x, y, z)
    }

    /// Transform a vector (no translation).
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        let x = self.at(0, 0) * v.x + self.at(0, 1) * v.y + self.at(0, 2) * v.z;
        let y = self.at(1, 0) * v.x + self.at(1, 1) * v.y + self.at(1, 2) * v.z;
        let z = self.at(2, 0) * v.x + self.at(2, 1) * v.y + self.at(2, 2) * v.z;
        Vec3::new(x, y, z)
    }

    /// Compose two transforms: self * other (`other` is applied first).
    pub fn then(&self, other: &Transform) -> Transform {
        let mut result = [0.0f64; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.at(row, k) * other.at(k, col);
                }
                result[col * 4 + row] = sum;
            }
        }
        Transform { m: result }
    }

    /// Determinant of the linear 3x3 block. Negative for mirroring transforms.
    pub fn determinant(&self) -> f64 {
        self.column(0).dot(&self.column(1).cross(&self.column(2)))
    }

    /// Inverse of an affine transform. Returns `None` if the linear block is singular.
    pub fn inverse(&self) -> Option<Self> {
        let (c0, c1, c2) = (self.column(0), self.column(1), self.column(2));
        let det = c0.dot(&c1.cross(&c2));
        if det.abs() < 1e-15 {
            return None;
        }
        // Rows of the inverse linear block are the scaled cross products of the columns.
        let r0 = c1.cross(&c2) / det;
        let r1 = c2.cross(&c0) / det;
        let r2 = c0.cross(&c1) / det;
        let t = self.column(3);
        let inv_t = Vec3::new(-r0.dot(&t), -r1.dot(&t), -r2.dot(&t));
        #[rustfmt::skip]
        let m = [
            r0.x, r1.x, r2.x, 0.0,
            r0.y, r1.y, r2.y, 0.0,
            r0.z, r1.z, r2.z, 0.0,
            inv_t.x, inv_t.y, inv_t.z, 1.0,
        ];
        Some(Transform { m })
    }

    /// True when the linear block is orthonormal, i.e. the transform preserves
    /// distances and angles (a rotation, possibly composed with a mirror).
    pub fn is_isometry(&self, tolerance: f64) -> bool {
        let cols = [self.column(0), self.column(1), self.column(2)];
        for i in 0..3 {
            if (cols[i].length_squared() - 1.0).abs() > tolerance {
                return false;
            }
            for j in (i + 1)..3 {
                if cols[i].dot(&cols[j]).abs() > tolerance {
                    return false;
                }
            }
        }
        true
    }

    /// The "frame-to-frame mapping": the rigid transform carrying `from` onto `to`.
    pub fn frame_to_frame(from: &Frame, to: &Frame) -> Transform {
        to.to_world().then(&from.to_local())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// An orthonormal right-handed coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point3d,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
}

impl Frame {
    /// Frame with the given z axis and an x axis taken from `x_dir` projected
    /// into the plane orthogonal to `normal`. `None` when either direction is
    /// degenerate or they are parallel.
    pub fn from_x_and_normal(origin: Point3d, x_dir: Vec3, normal: Vec3) -> Option<Self> {
        let z_axis = normal.normalized()?;
        let x_axis = x_dir.reject_from(&z_axis).normalized()?;
        let y_axis = z_axis.cross(&x_axis);
        Some(Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    /// The world frame.
    pub fn world() -> Self {
        Self {
            origin: Point3d::ORIGIN,
            x_axis: Vec3::X,
            y_axis: Vec3::Y,
            z_axis: Vec3::Z,
        }
    }

    /// The layout frame: world origin and x axis, looking down onto the XY
    /// plane (z axis pointing to -Z).
    pub fn world_flipped() -> Self {
        Self {
            origin: Point3d::ORIGIN,
            x_axis: Vec3::X,
            y_axis: -Vec3::Y,
            z_axis: -Vec3::Z,
        }
    }

    /// Local coordinates to world coordinates.
    pub fn to_world(&self) -> Transform {
        Transform::from_columns(self.x_axis, self.y_axis, self.z_axis, self.origin.to_vec3())
    }

    /// World coordinates to local coordinates (transpose of the rotation).
    pub fn to_local(&self) -> Transform {
        let o = self.origin.to_vec3();
        let (x, y, z) = (self.x_axis, self.y_axis, self.z_axis);
        #[rustfmt::skip]
        let m = [
            x.x, y.x, z.x, 0.0,
            x.y, y.y, z.y, 0.0,
            x.z, y.z, z.z, 0.0,
            -x.dot(&o), -y.dot(&o), -z.dot(&o), 1.0,
        ];
        Transform { m }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: &[Point3d]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut bb = *self;
        bb.expand_to_include(&other.min);
        bb.expand_to_include(&other.max);
        bb
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }
}
