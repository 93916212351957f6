use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Edge curve representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve {
    Line(Line3d),
    Circle(Circle3d),
}

/// A straight segment parameterized so that t = 0 is `origin` and t = 1 is
/// `origin + direction`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line3d {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl Line3d {
    pub fn from_points(a: Point3d, b: Point3d) -> Self {
        Self {
            origin: a,
            direction: b - a,
        }
    }

    pub fn length(&self, t0: f64, t1: f64) -> f64 {
        self.direction.length() * (t1 - t0).abs()
    }
}

/// A circle in 3D space, parameterized by angle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Circle3d {
    pub center: Point3d,
    pub normal: Vec3,
    pub radius: f64,
    /// Reference direction in the plane (x-axis of the local frame).
    pub x_axis: Vec3,
}

impl Circle3d {
    /// Circle through `start` around `center`, with `start` at angle zero.
    /// Returns `None` when `start` coincides with `center` or the normal is
    /// degenerate.
    pub fn through(center: Point3d, normal: Vec3, start: Point3d) -> Option<Self> {
        let normal = normal.normalized()?;
        let radial = (start - center).reject_from(&normal);
        let radius = radial.length();
        let x_axis = radial.normalized()?;
        Some(Self {
            center,
            normal,
            radius,
            x_axis,
        })
    }

    fn y_axis(&self) -> Vec3 {
        self.normal.cross(&self.x_axis)
    }

    /// Evaluate at angle t (radians).
    pub fn evaluate(&self, t: f64) -> Point3d {
        let y_axis = self.y_axis();
        self.center + self.x_axis * (self.radius * t.cos()) + y_axis * (self.radius * t.sin())
    }

    /// Angle of `p` measured counter-clockwise about the normal, in (0, 2*PI].
    pub fn angle_of(&self, p: &Point3d) -> f64 {
        let v = *p - self.center;
        let angle = v.dot(&self.y_axis()).atan2(v.dot(&self.x_axis));
        if angle <= 0.0 {
            angle + std::f64::consts::TAU
        } else {
            angle
        }
    }

    pub fn length(&self, t0: f64, t1: f64) -> f64 {
        self.radius * (t1 - t0).abs()
    }
}

impl Curve {
    /// Arc length over the given parameter range.
    pub fn length(&self, t0: f64, t1: f64) -> f64 {
        match self {
            Curve::Line(l) => l.length(t0, t1),
            Curve::Circle(c) => c.length(t0, t1),
        }
    }

    /// Points strictly between t0 and t1, evenly spaced in parameter, in the
    /// direction t0 -> t1. Straight lines need none.
    pub fn interior_samples(&self, t0: f64, t1: f64, segments: usize) -> Vec<Point3d> {
        match self {
            Curve::Line(_) => Vec::new(),
            Curve::Circle(c) => (1..segments.max(1))
                .map(|i| c.evaluate(t0 + (t1 - t0) * (i as f64 / segments as f64)))
                .collect(),
        }
    }
}
