use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::brep::*;
use crate::geometry::curves::{Circle3d, Curve, Line3d};
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::{Plane, Surface};
use crate::geometry::vector::Vec3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("a loop needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("vertex index {index} was never added")]
    UnknownVertex { index: usize },

    #[error("vertex index {index} appears twice in one loop")]
    RepeatedVertex { index: usize },

    #[error("face boundary encloses no area")]
    DegenerateFace,

    #[error("arc endpoints are not on a common circle")]
    DegenerateArc,
}

/// Assembles a shell from vertex positions and polygonal loops.
///
/// Edges are shared between faces by vertex pair, so two faces listing the
/// same pair of indices meet along one edge. A pair listed by three faces
/// yields a non-manifold edge, which the builder allows.
pub struct ShellBuilder<'a> {
    store: &'a mut EntityStore,
    shell: ShellId,
    vertices: Vec<VertexId>,
    edges: HashMap<(usize, usize), EdgeId>,
}

impl<'a> ShellBuilder<'a> {
    pub fn new(store: &'a mut EntityStore) -> Self {
        let shell = store.shells.insert(Shell::default());
        Self {
            store,
            shell,
            vertices: Vec::new(),
            edges: HashMap::new(),
        }
    }

    /// Add a vertex and return its index for use in loops.
    pub fn add_vertex(&mut self, point: Point3d) -> usize {
        self.vertices.push(self.store.vertices.insert(Vertex { point }));
        self.vertices.len() - 1
    }

    pub fn add_vertices(&mut self, points: &[Point3d]) -> Vec<usize> {
        points.iter().map(|&p| self.add_vertex(p)).collect()
    }

    /// Make the edge between vertices `a` and `b` a circular arc around
    /// `center`, running counter-clockwise about `normal` from `a` to `b`.
    /// Loops added afterwards that step between `a` and `b` use the arc.
    pub fn add_arc(&mut self, a: usize, b: usize, center: Point3d, normal: Vec3) -> Result<EdgeId, BuildError> {
        if a == b {
            return Err(BuildError::RepeatedVertex { index: a });
        }
        let pa = self.point(a)?;
        let pb = self.point(b)?;
        let circle = Circle3d::through(center, normal, pa).ok_or(BuildError::DegenerateArc)?;
        if (center.distance_to(&pb) - circle.radius).abs() > crate::default_tolerance().coincidence * 10.0 {
            return Err(BuildError::DegenerateArc);
        }
        let t_end = circle.angle_of(&pb);
        let edge = self.store.edges.insert(Edge {
            curve: Curve::Circle(circle),
            start_vertex: self.vertices[a],
            end_vertex: self.vertices[b],
            t_start: 0.0,
            t_end,
            uses: Vec::new(),
        });
        self.edges.insert(edge_key(a, b), edge);
        Ok(edge)
    }

    /// Add a planar face bounded by the given vertex loop. The loop winds
    /// counter-clockwise when viewed from outside the material.
    pub fn add_face(&mut self, outer: &[usize]) -> Result<FaceId, BuildError> {
        self.add_face_with_holes(outer, &[])
    }

    /// Add a planar face with inner loops. Holes wind clockwise when viewed
    /// from outside the material.
    pub fn add_face_with_holes(&mut self, outer: &[usize], holes: &[&[usize]]) -> Result<FaceId, BuildError> {
        let points = self.loop_points(outer)?;
        let normal = newell_normal(&points).ok_or(BuildError::DegenerateFace)?;
        let centroid = centroid(&points);
        let plane = Plane::new(centroid, normal).ok_or(BuildError::DegenerateFace)?;
        self.insert_face(outer, holes, Surface::Plane(plane), true)
    }

    /// Add a face carried by an explicit surface, e.g. a curved patch.
    pub fn add_face_on_surface(
        &mut self,
        outer: &[usize],
        surface: Surface,
        same_sense: bool,
    ) -> Result<FaceId, BuildError> {
        self.loop_points(outer)?;
        self.insert_face(outer, &[], surface, same_sense)
    }

    pub fn finish(self) -> ShellId {
        debug!(
            faces = self.store.shells[self.shell].faces.len(),
            edges = self.edges.len(),
            "shell assembled"
        );
        self.shell
    }

    fn point(&self, index: usize) -> Result<Point3d, BuildError> {
        self.vertices
            .get(index)
            .map(|&v| self.store.vertices[v].point)
            .ok_or(BuildError::UnknownVertex { index })
    }

    fn loop_points(&self, indices: &[usize]) -> Result<Vec<Point3d>, BuildError> {
        if indices.len() < 3 {
            return Err(BuildError::TooFewVertices { count: indices.len() });
        }
        for (i, &index) in indices.iter().enumerate() {
            if indices[..i].contains(&index) {
                return Err(BuildError::RepeatedVertex { index });
            }
        }
        indices.iter().map(|&i| self.point(i)).collect()
    }

    fn insert_face(
        &mut self,
        outer: &[usize],
        holes: &[&[usize]],
        surface: Surface,
        same_sense: bool,
    ) -> Result<FaceId, BuildError> {
        for hole in holes {
            self.loop_points(hole)?;
        }

        let face_id = self.store.faces.insert(Face {
            surface,
            outer_loop: LoopId::default(),
            inner_loops: Vec::new(),
            same_sense,
            shell: self.shell,
        });
        let outer_loop = self.insert_loop(face_id, outer, true);
        let inner_loops: Vec<LoopId> = holes.iter().map(|h| self.insert_loop(face_id, h, false)).collect();

        let face = &mut self.store.faces[face_id];
        face.outer_loop = outer_loop;
        face.inner_loops = inner_loops;
        self.store.shells[self.shell].faces.push(face_id);
        Ok(face_id)
    }

    fn insert_loop(&mut self, face: FaceId, indices: &[usize], is_outer: bool) -> LoopId {
        let loop_id = self.store.loops.insert(Loop {
            half_edges: Vec::with_capacity(indices.len()),
            face,
            is_outer,
        });
        for k in 0..indices.len() {
            let (a, b) = (indices[k], indices[(k + 1) % indices.len()]);
            let edge = self.edge_between(a, b);
            let forward = self.store.edges[edge].start_vertex == self.vertices[a];
            let he = self.store.half_edges.insert(HalfEdge {
                edge,
                face,
                loop_id,
                forward,
            });
            self.store.edges[edge].uses.push(he);
            self.store.loops[loop_id].half_edges.push(he);
        }
        loop_id
    }

    /// Existing edge for the pair, or a new straight edge running from the
    /// lower to the higher vertex index.
    fn edge_between(&mut self, a: usize, b: usize) -> EdgeId {
        let key = edge_key(a, b);
        if let Some(&edge) = self.edges.get(&key) {
            return edge;
        }
        let (lo, hi) = key;
        let (v_lo, v_hi) = (self.vertices[lo], self.vertices[hi]);
        let line = Line3d::from_points(self.store.vertices[v_lo].point, self.store.vertices[v_hi].point);
        let edge = self.store.edges.insert(Edge {
            curve: Curve::Line(line),
            start_vertex: v_lo,
            end_vertex: v_hi,
            t_start: 0.0,
            t_end: 1.0,
            uses: Vec::new(),
        });
        self.edges.insert(key, edge);
        edge
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Newell's method: robust normal of a (possibly slightly non-planar) polygon.
fn newell_normal(points: &[Point3d]) -> Option<Vec3> {
    let mut n = Vec3::ZERO;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n.normalized()
}

fn centroid(points: &[Point3d]) -> Point3d {
    let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
    Point3d::ORIGIN + sum / points.len() as f64
}
