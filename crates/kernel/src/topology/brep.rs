use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::geometry::curves::Curve;
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::{Plane, Surface};
use crate::geometry::vector::Vec3;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct VertexId;
    pub struct EdgeId;
    pub struct HalfEdgeId;
    pub struct LoopId;
    pub struct FaceId;
    pub struct ShellId;
}

// ─── Topological Entities ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub point: Point3d,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub curve: Curve,
    pub start_vertex: VertexId,
    pub end_vertex: VertexId,
    /// Parameter range on the curve, from `start_vertex` to `end_vertex`.
    pub t_start: f64,
    pub t_end: f64,
    /// Every half-edge that traverses this edge. Two on a manifold interior
    /// edge, one on a laminar (boundary) edge, more on a non-manifold edge.
    pub uses: Vec<HalfEdgeId>,
}

/// One traversal of an edge by a face loop (a "fin").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HalfEdge {
    pub edge: EdgeId,
    pub face: FaceId,
    pub loop_id: LoopId,
    /// true if this half-edge runs from the edge's start vertex to its end vertex.
    pub forward: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    pub half_edges: Vec<HalfEdgeId>,
    pub face: FaceId,
    pub is_outer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub surface: Surface,
    pub outer_loop: LoopId,
    pub inner_loops: Vec<LoopId>,
    /// true if the face normal agrees with the surface normal.
    pub same_sense: bool,
    pub shell: ShellId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shell {
    pub faces: Vec<FaceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("edge {edge:?} is shared by {face_count} faces")]
    NonManifoldEdge { edge: EdgeId, face_count: usize },

    #[error("shell {0:?} is not in the store")]
    UnknownShell(ShellId),
}

// ─── Entity Store ────────────────────────────────────────────────────────────

/// Arena-based storage for all topological entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub vertices: SlotMap<VertexId, Vertex>,
    pub edges: SlotMap<EdgeId, Edge>,
    pub half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    pub loops: SlotMap<LoopId, Loop>,
    pub faces: SlotMap<FaceId, Face>,
    pub shells: SlotMap<ShellId, Shell>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shell_faces(&self, shell_id: ShellId) -> Result<&[FaceId], TopologyError> {
        self.shells
            .get(shell_id)
            .map(|s| s.faces.as_slice())
            .ok_or(TopologyError::UnknownShell(shell_id))
    }

    /// Outer loop first, then holes.
    pub fn face_loops(&self, face_id: FaceId) -> impl Iterator<Item = LoopId> + '_ {
        let face = &self.faces[face_id];
        std::iter::once(face.outer_loop).chain(face.inner_loops.iter().copied())
    }

    /// Start point of a half-edge in its own traversal direction.
    pub fn half_edge_start(&self, he_id: HalfEdgeId) -> Point3d {
        let he = &self.half_edges[he_id];
        let edge = &self.edges[he.edge];
        let v = if he.forward { edge.start_vertex } else { edge.end_vertex };
        self.vertices[v].point
    }

    pub fn half_edge_end(&self, he_id: HalfEdgeId) -> Point3d {
        let he = &self.half_edges[he_id];
        let edge = &self.edges[he.edge];
        let v = if he.forward { edge.end_vertex } else { edge.start_vertex };
        self.vertices[v].point
    }

    /// Points strictly between the half-edge's endpoints, in traversal order.
    /// Empty for straight edges.
    pub fn half_edge_samples(&self, he_id: HalfEdgeId, segments: usize) -> Vec<Point3d> {
        let he = &self.half_edges[he_id];
        let edge = &self.edges[he.edge];
        let (t0, t1) = if he.forward {
            (edge.t_start, edge.t_end)
        } else {
            (edge.t_end, edge.t_start)
        };
        edge.curve.interior_samples(t0, t1, segments)
    }

    pub fn edge_length(&self, edge_id: EdgeId) -> f64 {
        let edge = &self.edges[edge_id];
        edge.curve.length(edge.t_start, edge.t_end)
    }

    /// Distinct faces using an edge, in order of first use.
    pub fn edge_faces(&self, edge_id: EdgeId) -> Vec<FaceId> {
        let mut faces = Vec::new();
        for &he in &self.edges[edge_id].uses {
            let face = self.half_edges[he].face;
            if !faces.contains(&face) {
                faces.push(face);
            }
        }
        faces
    }

    /// The face on the other side of `edge_id` from `face_id`.
    ///
    /// `Ok(None)` for a laminar edge; an error when more than two faces share
    /// the edge, since "the other side" is then ambiguous.
    pub fn adjacent_face(&self, face_id: FaceId, edge_id: EdgeId) -> Result<Option<FaceId>, TopologyError> {
        let faces = self.edge_faces(edge_id);
        if faces.len() > 2 {
            return Err(TopologyError::NonManifoldEdge {
                edge: edge_id,
                face_count: faces.len(),
            });
        }
        Ok(faces.into_iter().find(|&f| f != face_id))
    }

    /// Oriented supporting plane of a planar face (normal points out of the
    /// material). `None` for curved faces.
    pub fn face_plane(&self, face_id: FaceId) -> Option<Plane> {
        let face = &self.faces[face_id];
        let plane = face.surface.as_plane()?;
        Some(if face.same_sense { *plane } else { plane.flipped() })
    }

    pub fn face_normal(&self, face_id: FaceId) -> Option<Vec3> {
        self.face_plane(face_id).map(|p| p.normal)
    }

    /// Distinct edges of a shell in traversal order (faces, then loops, then
    /// half-edges).
    pub fn shell_edges(&self, shell_id: ShellId) -> Result<Vec<EdgeId>, TopologyError> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for &face_id in self.shell_faces(shell_id)? {
            for loop_id in self.face_loops(face_id) {
                for &he in &self.loops[loop_id].half_edges {
                    let edge = self.half_edges[he].edge;
                    if seen.insert(edge) {
                        edges.push(edge);
                    }
                }
            }
        }
        Ok(edges)
    }

    /// Count topological entities for a shell: (vertices, edges, faces).
    pub fn count_topology(&self, shell_id: ShellId) -> Result<(usize, usize, usize), TopologyError> {
        let faces = self.shell_faces(shell_id)?;
        let edges = self.shell_edges(shell_id)?;
        let mut vertex_set = HashSet::new();
        for &edge_id in &edges {
            let edge = &self.edges[edge_id];
            vertex_set.insert(edge.start_vertex);
            vertex_set.insert(edge.end_vertex);
        }
        Ok((vertex_set.len(), edges.len(), faces.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curves::Line3d;

    #[test]
    fn test_entity_store_creation() {
        let store = EntityStore::new();
        assert_eq!(store.vertices.len(), 0);
        assert_eq!(store.edges.len(), 0);
    }

    #[test]
    fn test_vertex_insertion() {
        let mut store = EntityStore::new();
        let v = store.vertices.insert(Vertex {
            point: Point3d::new(1.0, 2.0, 3.0),
        });
        assert_eq!(store.vertices[v].point.x, 1.0);
    }

    #[test]
    fn test_unknown_shell_is_reported() {
        let mut store = EntityStore::new();
        let shell = store.shells.insert(Shell::default());
        store.shells.remove(shell);
        assert_eq!(store.shell_faces(shell), Err(TopologyError::UnknownShell(shell)));
    }

    #[test]
    fn test_edge_length_of_line() {
        let mut store = EntityStore::new();
        let a = store.vertices.insert(Vertex { point: Point3d::ORIGIN });
        let b = store.vertices.insert(Vertex {
            point: Point3d::new(0.0, 3.0, 4.0),
        });
        let e = store.edges.insert(Edge {
            curve: Curve::Line(Line3d::from_points(Point3d::ORIGIN, Point3d::new(0.0, 3.0, 4.0))),
            start_vertex: a,
            end_vertex: b,
            t_start: 0.0,
            t_end: 1.0,
            uses: Vec::new(),
        });
        assert!((store.edge_length(e) - 5.0).abs() < 1e-12);
        assert!(store.edge_faces(e).is_empty());
    }
}
