use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Face support surfaces. Only planes can be laid flat; the curved kinds
/// exist so that shells can carry them and the unfolder can refuse them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Surface {
    Plane(Plane),
    Cylinder(Cylinder),
    Sphere(Sphere),
}

/// An infinite plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub normal: Vec3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl Plane {
    /// Returns `None` for a zero normal.
    pub fn new(origin: Point3d, normal: Vec3) -> Option<Self> {
        let normal = normal.normalized()?;
        let helper = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let u_axis = helper.cross(&normal).normalized()?;
        let v_axis = normal.cross(&u_axis);
        Some(Self {
            origin,
            normal,
            u_axis,
            v_axis,
        })
    }

    pub fn xy() -> Self {
        Self {
            origin: Point3d::ORIGIN,
            normal: Vec3::Z,
            u_axis: Vec3::X,
            v_axis: Vec3::Y,
        }
    }

    /// The same plane with the normal reversed.
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            normal: -self.normal,
            u_axis: self.v_axis,
            v_axis: self.u_axis,
        }
    }
}

/// A cylinder surface (infinite along axis).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cylinder {
    pub origin: Point3d,
    pub axis: Vec3,
    pub radius: f64,
}

impl Cylinder {
    pub fn new(origin: Point3d, axis: Vec3, radius: f64) -> Option<Self> {
        Some(Self {
            origin,
            axis: axis.normalized()?,
            radius,
        })
    }
}

/// A sphere surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point3d,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Point3d, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Surface {
    /// The supporting plane, or `None` for a curved surface.
    pub fn as_plane(&self) -> Option<&Plane> {
        match self {
            Surface::Plane(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_planar(&self) -> bool {
        self.as_plane().is_some()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Surface::Plane(_) => "Plane",
            Surface::Cylinder(_) => "Cylinder",
            Surface::Sphere(_) => "Sphere",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_axes_orthonormal() {
        let p = Plane::new(Point3d::new(1.0, 1.0, 1.0), Vec3::new(1.0, 2.0, 2.0)).unwrap();
        assert!((p.normal.length() - 1.0).abs() < 1e-12);
        assert!(p.u_axis.dot(&p.normal).abs() < 1e-12);
        assert!(p.v_axis.dot(&p.u_axis).abs() < 1e-12);
        assert!(Plane::new(Point3d::ORIGIN, Vec3::ZERO).is_none());
    }

    #[test]
    fn test_flipped_plane_stays_right_handed() {
        let p = Plane::new(Point3d::ORIGIN, Vec3::new(0.0, 1.0, 1.0)).unwrap().flipped();
        let n = p.u_axis.cross(&p.v_axis);
        assert!((n - p.normal).length() < 1e-12);
        assert!((p.normal.z + std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_surface_kind_and_planarity() {
        let plane = Surface::Plane(Plane::xy());
        let cyl = Surface::Cylinder(Cylinder::new(Point3d::ORIGIN, Vec3::Z, 1.0).unwrap());
        let sphere = Surface::Sphere(Sphere::new(Point3d::ORIGIN, 2.0));
        assert!(plane.is_planar());
        assert!(!cyl.is_planar());
        assert_eq!(cyl.kind(), "Cylinder");
        assert_eq!(sphere.kind(), "Sphere");
        assert!(sphere.as_plane().is_none());
    }
}
