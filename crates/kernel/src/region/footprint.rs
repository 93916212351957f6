use geo::{Area, BoundingRect, MultiPolygon, Rect};

use super::polygon::PlanarRegion;

/// Accumulated union of the regions committed to one layout island.
#[derive(Debug, Clone)]
pub struct Footprint {
    shape: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl Default for Footprint {
    fn default() -> Self {
        Self {
            shape: MultiPolygon::new(Vec::new()),
            bounds: None,
        }
    }
}

impl Footprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_region(region: &PlanarRegion) -> Self {
        Self {
            shape: MultiPolygon::new(vec![region.polygon().clone()]),
            bounds: Some(region.bounds()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty()
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    pub(crate) fn replace(&mut self, shape: MultiPolygon<f64>) {
        self.bounds = shape.bounding_rect();
        self.shape = shape;
    }
}
