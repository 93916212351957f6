use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, BoundingRect, Contains, Coord, Distance, Euclidean, LineString, Point, Polygon, Rect, Relate};

use super::RegionError;
use crate::Tolerance;
use crate::geometry::point::{Point2d, signed_area};

/// A closed region of the layout plane: one outer ring and any number of
/// holes, stored with the exterior counter-clockwise.
#[derive(Debug, Clone)]
pub struct PlanarRegion {
    polygon: Polygon<f64>,
    area: f64,
    perimeter: f64,
    bounds: Rect<f64>,
}

impl PlanarRegion {
    /// Build a region from boundary rings in either winding.
    pub fn from_rings(outer: &[Point2d], holes: &[Vec<Point2d>], tolerance: &Tolerance) -> Result<Self, RegionError> {
        let outer = clean_ring(outer, tolerance)?;
        let holes = holes
            .iter()
            .map(|h| clean_ring(h, tolerance))
            .collect::<Result<Vec<_>, _>>()?;
        check_holes(&outer, &holes)?;

        let perimeter = ring_length(&outer) + holes.iter().map(|h| ring_length(h)).sum::<f64>();
        let polygon = Polygon::new(
            to_line_string(&outer),
            holes.iter().map(|h| to_line_string(h)).collect(),
        )
        .orient(Direction::Default);

        let area = polygon.unsigned_area();
        if area <= tolerance.coincidence * perimeter {
            return Err(RegionError::ZeroArea);
        }
        let bounds = polygon.bounding_rect().ok_or(RegionError::ZeroArea)?;
        Ok(Self {
            polygon,
            area,
            perimeter,
            bounds,
        })
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Whether `p` lies inside the region or within `eps` of its boundary.
    pub fn covers(&self, p: &Point2d, eps: f64) -> bool {
        Euclidean::distance(&Point::new(p.x, p.y), &self.polygon) <= eps
    }
}

/// Drop repeated points (including a closing duplicate) and validate what is left.
fn clean_ring(ring: &[Point2d], tolerance: &Tolerance) -> Result<Vec<Point2d>, RegionError> {
    if ring.iter().any(|p| !p.is_finite()) {
        return Err(RegionError::NonFinite);
    }
    let mut cleaned: Vec<Point2d> = Vec::with_capacity(ring.len());
    for &p in ring {
        if cleaned.last().is_none_or(|q| q.distance_to(&p) >= tolerance.coincidence) {
            cleaned.push(p);
        }
    }
    while cleaned.len() > 1 && cleaned[0].distance_to(&cleaned[cleaned.len() - 1]) < tolerance.coincidence {
        cleaned.pop();
    }
    if cleaned.len() < 3 {
        return Err(RegionError::TooFewPoints { count: cleaned.len() });
    }
    if signed_area(&cleaned).abs() <= tolerance.coincidence * ring_length(&cleaned) {
        return Err(RegionError::ZeroArea);
    }
    if self_intersects(&cleaned, tolerance.coincidence) {
        return Err(RegionError::SelfIntersecting);
    }
    Ok(cleaned)
}

fn ring_length(ring: &[Point2d]) -> f64 {
    (0..ring.len())
        .map(|i| ring[i].distance_to(&ring[(i + 1) % ring.len()]))
        .sum()
}

/// True when the ring doubles back on itself at a vertex, or when two
/// non-adjacent segments cross, overlap, or touch.
fn self_intersects(ring: &[Point2d], eps: f64) -> bool {
    let n = ring.len();
    for i in 0..n {
        let (prev, cur, next) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
        let backwards = (cur.x - prev.x) * (next.x - cur.x) + (cur.y - prev.y) * (next.y - cur.y) < 0.0;
        if backwards && on_line(&next, &prev, &cur, eps) {
            return true;
        }
    }
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        for j in (i + 2)..n {
            // The last segment is adjacent to the first.
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (ring[j], ring[(j + 1) % n]);
            if segments_meet(&a, &b, &c, &d, eps) {
                return true;
            }
        }
    }
    false
}

/// `p` lies on the infinite line through `a` and `b`, within `eps`.
fn on_line(p: &Point2d, a: &Point2d, b: &Point2d, eps: f64) -> bool {
    p.orientation(a, b).abs() <= eps * a.distance_to(b)
}

/// `p` lies on the closed segment `a`..`b`, within `eps`.
fn on_segment(p: &Point2d, a: &Point2d, b: &Point2d, eps: f64) -> bool {
    on_line(p, a, b, eps)
        && p.x >= a.x.min(b.x) - eps
        && p.x <= a.x.max(b.x) + eps
        && p.y >= a.y.min(b.y) - eps
        && p.y <= a.y.max(b.y) + eps
}

fn segments_meet(a: &Point2d, b: &Point2d, c: &Point2d, d: &Point2d, eps: f64) -> bool {
    let crosses_cd = c.orientation(a, b) * d.orientation(a, b) < 0.0;
    let crosses_ab = a.orientation(c, d) * b.orientation(c, d) < 0.0;
    (crosses_cd && crosses_ab)
        || on_segment(c, a, b, eps)
        || on_segment(d, a, b, eps)
        || on_segment(a, c, d, eps)
        || on_segment(b, c, d, eps)
}

/// Every hole sits inside the outer ring and holes meet at most along
/// their boundaries.
fn check_holes(outer: &[Point2d], holes: &[Vec<Point2d>]) -> Result<(), RegionError> {
    let shell = Polygon::new(to_line_string(outer), Vec::new());
    let holes: Vec<Polygon<f64>> = holes
        .iter()
        .map(|h| Polygon::new(to_line_string(h), Vec::new()))
        .collect();
    for (i, hole) in holes.iter().enumerate() {
        if !shell.contains(hole) {
            return Err(RegionError::HoleOutside);
        }
        for other in &holes[i + 1..] {
            let relation = hole.relate(other);
            if relation.is_intersects() && !relation.is_touches() {
                return Err(RegionError::HolesOverlap);
            }
        }
    }
    Ok(())
}

fn to_line_string(ring: &[Point2d]) -> LineString<f64> {
    LineString::from(ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::algorithm::winding_order::Winding;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2d> {
        coords.iter().map(|&(x, y)| Point2d::new(x, y)).collect()
    }

    #[test]
    fn test_clockwise_input_is_reoriented() {
        let tol = Tolerance::default();
        let cw = pts(&[(0.0, 0.0), (0.0, 1.0), (2.0, 1.0), (2.0, 0.0)]);
        let region = PlanarRegion::from_rings(&cw, &[], &tol).unwrap();
        assert!(region.polygon().exterior().is_ccw());
        assert!((region.area() - 2.0).abs() < 1e-12);
        assert!((region.perimeter() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_hole_reduces_area() {
        let tol = Tolerance::default();
        let outer = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = pts(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let region = PlanarRegion::from_rings(&outer, &[hole], &tol).unwrap();
        assert!((region.area() - 12.0).abs() < 1e-12);
        assert!((region.perimeter() - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_covers_boundary_but_not_holes() {
        let tol = Tolerance::default();
        let outer = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = pts(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let region = PlanarRegion::from_rings(&outer, &[hole], &tol).unwrap();
        assert!(region.covers(&Point2d::new(0.5, 0.5), 0.0));
        assert!(region.covers(&Point2d::new(4.0 + 1e-9, 2.0), 1e-7));
        assert!(!region.covers(&Point2d::new(2.0, 2.0), 1e-7));
        assert!(!region.covers(&Point2d::new(5.0, 2.0), 1e-7));
    }

    #[test]
    fn test_closing_duplicate_is_ignored() {
        let tol = Tolerance::default();
        let ring = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let region = PlanarRegion::from_rings(&ring, &[], &tol).unwrap();
        assert!((region.area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_rings() {
        let tol = Tolerance::default();
        assert_eq!(
            PlanarRegion::from_rings(&pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0)]), &[], &tol).unwrap_err(),
            RegionError::TooFewPoints { count: 2 }
        );
        assert_eq!(
            PlanarRegion::from_rings(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]), &[], &tol).unwrap_err(),
            RegionError::ZeroArea
        );
        assert_eq!(
            PlanarRegion::from_rings(&pts(&[(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)]), &[], &tol).unwrap_err(),
            RegionError::NonFinite
        );
    }

    #[test]
    fn test_rejects_ring_doubling_back() {
        let tol = Tolerance::default();
        let spike = pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (2.0, 3.0), (2.0, 1.0), (0.0, 2.0)]);
        assert_eq!(
            PlanarRegion::from_rings(&spike, &[], &tol).unwrap_err(),
            RegionError::SelfIntersecting
        );
        // Two non-adjacent edges running along the same line.
        let overlap = pts(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 2.0),
            (3.0, 2.0),
            (3.0, 0.0),
            (1.0, 0.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ]);
        assert_eq!(
            PlanarRegion::from_rings(&overlap, &[], &tol).unwrap_err(),
            RegionError::SelfIntersecting
        );
    }

    #[test]
    fn test_rejects_misplaced_holes() {
        let tol = Tolerance::default();
        let outer = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let outside = pts(&[(5.0, 1.0), (6.0, 1.0), (6.0, 2.0), (5.0, 2.0)]);
        assert_eq!(
            PlanarRegion::from_rings(&outer, &[outside], &tol).unwrap_err(),
            RegionError::HoleOutside
        );
        let crossing = pts(&[(3.0, 1.0), (5.0, 1.0), (5.0, 2.0), (3.0, 2.0)]);
        assert_eq!(
            PlanarRegion::from_rings(&outer, &[crossing], &tol).unwrap_err(),
            RegionError::HoleOutside
        );
        let a = pts(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let b = pts(&[(2.0, 2.0), (3.5, 2.0), (3.5, 3.5), (2.0, 3.5)]);
        assert_eq!(
            PlanarRegion::from_rings(&outer, &[a.clone(), b], &tol).unwrap_err(),
            RegionError::HolesOverlap
        );
        let beside = pts(&[(3.0, 1.0), (3.5, 1.0), (3.5, 2.0), (3.0, 2.0)]);
        assert!(PlanarRegion::from_rings(&outer, &[a, beside], &tol).is_ok());
    }

    #[test]
    fn test_rejects_bow_tie() {
        let tol = Tolerance::default();
        let bow_tie = pts(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 1.0)]);
        assert_eq!(
            PlanarRegion::from_rings(&bow_tie, &[], &tol).unwrap_err(),
            RegionError::SelfIntersecting
        );
    }
}
