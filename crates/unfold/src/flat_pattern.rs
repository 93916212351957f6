use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use unfold_kernel::geometry::point::{Point2d, Point3d};
use unfold_kernel::geometry::surfaces::Plane;
use unfold_kernel::geometry::transform::BoundingBox;
use unfold_kernel::{DefaultRegionBoolean, EdgeId, EntityStore, FaceId, RegionBoolean, ShellId};

use crate::cancel::{Cancellation, NeverCancel};
use crate::config::{NonPlanarPolicy, UnfoldConfig};
use crate::error::{Diagnostic, DiagnosticKind, Outcome, PlacementError, UnfoldError};
use crate::flat_body::{Env, FlatBody, Hinge, placement_diagnostic};
use crate::flat_face::FlatFace;
use crate::flat_fin::FlatFin;
use crate::registry::{FinRef, FlatFaceId, Registry};
use crate::survey::survey_surfaces;

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnfoldStats {
    pub faces: usize,
    pub bodies: usize,
    pub fold_edges: usize,
    pub cut_edges: usize,
    pub skipped_faces: usize,
    pub elapsed: Duration,
}

/// A fold line shallow enough to be drawn as a break line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakLine {
    pub edge: EdgeId,
    pub start: Point2d,
    pub end: Point2d,
    /// Angle between the two faces' outward normals (radians).
    pub bend_angle: f64,
}

/// The unfolded shell: islands of flattened faces plus the pairing of their
/// shared edges.
#[derive(Debug)]
pub struct FlatPattern {
    shell: ShellId,
    config: UnfoldConfig,
    bodies: Vec<FlatBody>,
    registry: Registry,
    unreached: Vec<FaceId>,
    outcome: Outcome,
    stats: UnfoldStats,
}

impl FlatPattern {
    /// Unfold with the default `geo` region engine and no cancellation.
    pub fn unfold(store: &EntityStore, shell: ShellId, config: UnfoldConfig) -> Result<Self, UnfoldError> {
        let regions = DefaultRegionBoolean::new(config.tolerance);
        Self::unfold_with(store, shell, config, &regions, &NeverCancel)
    }

    #[instrument(skip(store, config, regions, cancel))]
    pub fn unfold_with(
        store: &EntityStore,
        shell: ShellId,
        config: UnfoldConfig,
        regions: &dyn RegionBoolean,
        cancel: &dyn Cancellation,
    ) -> Result<Self, UnfoldError> {
        let started = Instant::now();
        if !config.tolerance.is_valid() {
            return Err(UnfoldError::InvalidTolerance(config.tolerance));
        }
        let mut config = config;
        config.break_lines = config.break_lines.normalized();

        let faces = store.shell_faces(shell)?;
        if faces.is_empty() {
            return Err(UnfoldError::EmptyShell);
        }
        for edge in store.shell_edges(shell)? {
            let face_count = store.edge_faces(edge).len();
            if face_count > 2 {
                return Err(UnfoldError::Adjacency { edge, face_count });
            }
        }

        let mut registry = Registry::new();
        let survey = survey_surfaces(store, shell)?;
        if !survey.is_all_planar() {
            match config.non_planar {
                NonPlanarPolicy::Abort => {
                    return Err(UnfoldError::UnsupportedGeometry {
                        faces: survey.non_planar,
                    });
                }
                NonPlanarPolicy::Skip => {
                    for &face in &survey.non_planar {
                        registry.skip(face, DiagnosticKind::NonPlanarSkipped);
                    }
                }
            }
        }

        let seed = match config.start_face {
            Some(face) if !faces.contains(&face) => return Err(UnfoldError::UnknownStartFace),
            Some(face) if registry.is_excluded(face) => {
                return Err(UnfoldError::UnsupportedGeometry { faces: vec![face] });
            }
            Some(face) => Some(face),
            None => longest_edge_face(store, faces, &registry),
        };

        let env = Env {
            store,
            config: &config,
            regions,
            cancel,
        };
        let mut bodies: Vec<FlatBody> = Vec::new();
        let mut pending: VecDeque<FinRef> = VecDeque::new();
        let mut cancelled = false;

        if let Some(seed) = seed {
            debug!(face = ?seed, "seed face chosen");
            let rank = registry.next_rank();
            let face = match FlatFace::seed(store, seed, 0, rank, &config.tolerance) {
                Ok(face) => face,
                Err(PlacementError::Topology(err)) => return Err(err.into()),
                Err(_) => return Err(UnfoldError::DegenerateSeed { face: seed }),
            };
            let mut body = FlatBody::new(0);
            body.seed(&env, &mut registry, face, None);
            let growth = body.grow(&env, &mut registry)?;
            pending.extend(growth.deferred);
            cancelled = growth.cancelled;
            bodies.push(body);
        }

        while !cancelled {
            pending.retain(|&fin| registry.fin(fin).neighbor.is_some_and(|f| registry.is_claimable(f)));
            let Some(fin) = pending.pop_front() else {
                break;
            };
            let Some(target) = registry.fin(fin).neighbor else {
                continue;
            };
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let index = bodies.len();
            let rank = registry.next_rank();
            let at = (fin.loop_index, fin.fin_index);
            let placed = FlatFace::across(store, target, index, rank, registry.face(fin.face), at, &config.tolerance);
            let (face, own) = match placed {
                Ok(placed) => placed,
                Err(PlacementError::Topology(err)) => return Err(err.into()),
                Err(err) => {
                    let edge = registry.fin(fin).edge;
                    registry.skip(target, placement_diagnostic(&err, edge));
                    continue;
                }
            };
            debug!(body = index, face = ?target, "new island seeded from deferred fin");

            let mut body = FlatBody::new(index);
            let hinge = Hinge {
                base: fin,
                own,
                fold: false,
            };
            body.seed(&env, &mut registry, face, Some(hinge));
            let growth = body.grow(&env, &mut registry)?;
            pending.extend(growth.deferred);
            cancelled = growth.cancelled;
            bodies.push(body);
        }

        let unreached: Vec<FaceId> = faces.iter().copied().filter(|&f| registry.is_claimable(f)).collect();
        if !cancelled && !unreached.is_empty() {
            warn!(count = unreached.len(), "faces not connected to the seed were not unfolded");
        }

        let mut pattern = Self {
            shell,
            config,
            bodies,
            registry,
            unreached,
            outcome: if cancelled { Outcome::Cancelled } else { Outcome::Complete },
            stats: UnfoldStats {
                faces: 0,
                bodies: 0,
                fold_edges: 0,
                cut_edges: 0,
                skipped_faces: 0,
                elapsed: Duration::ZERO,
            },
        };
        pattern.stats = UnfoldStats {
            faces: pattern.registry.placed_count(),
            bodies: pattern.bodies.len(),
            fold_edges: pattern.fold_edges().len(),
            cut_edges: pattern.cut_edges().len(),
            skipped_faces: pattern.registry.excluded_count(),
            elapsed: started.elapsed(),
        };
        info!(
            faces = pattern.stats.faces,
            bodies = pattern.stats.bodies,
            folds = pattern.stats.fold_edges,
            cuts = pattern.stats.cut_edges,
            elapsed_ms = pattern.stats.elapsed.as_millis() as u64,
            outcome = ?pattern.outcome,
            "unfold finished"
        );
        Ok(pattern)
    }

    pub fn shell(&self) -> ShellId {
        self.shell
    }

    pub fn config(&self) -> &UnfoldConfig {
        &self.config
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn stats(&self) -> &UnfoldStats {
        &self.stats
    }

    /// Islands in creation order.
    pub fn bodies(&self) -> &[FlatBody] {
        &self.bodies
    }

    pub fn face(&self, id: FlatFaceId) -> &FlatFace {
        self.registry.face(id)
    }

    /// All flattened faces, island by island in placement order.
    pub fn faces(&self) -> impl Iterator<Item = (FlatFaceId, &FlatFace)> {
        self.bodies
            .iter()
            .flat_map(|b| b.faces().iter().map(|&id| (id, self.registry.face(id))))
    }

    pub fn flat_face_for(&self, source: FaceId) -> Option<&FlatFace> {
        self.registry.placed(source).map(|id| self.registry.face(id))
    }

    pub fn contains_face(&self, source: FaceId) -> bool {
        self.registry.is_placed(source)
    }

    pub fn fin(&self, fin: FinRef) -> &FlatFin {
        self.registry.fin(fin)
    }

    /// The placed fin on the other side of `fin`'s edge, if that face is placed.
    pub fn adjacent_fin(&self, fin: FinRef) -> Option<FinRef> {
        self.registry.pair(self.registry.fin(fin).edge)?.other(fin)
    }

    /// Whether two placed faces meet along a paired edge.
    pub fn is_adjacent(&self, a: FlatFaceId, b: FlatFaceId) -> bool {
        a != b
            && self
                .registry
                .pairs()
                .any(|(_, p)| (p.first.face == a && p.second.face == b) || (p.first.face == b && p.second.face == a))
    }

    /// Edges folded inside an island, in edge-key order.
    pub fn fold_edges(&self) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = self.registry.pairs().filter(|(_, p)| p.fold).map(|(&e, _)| e).collect();
        edges.sort();
        edges
    }

    /// Distinct edges of placed faces that are not folds: laminar edges,
    /// edges to unplaced faces, and seams between or within islands.
    pub fn cut_edges(&self) -> Vec<EdgeId> {
        let folds: HashSet<EdgeId> = self.fold_edges().into_iter().collect();
        let mut edges: Vec<EdgeId> = self
            .registry
            .faces()
            .flat_map(|(_, face)| face.fins().map(|(_, fin)| fin.edge))
            .filter(|e| !folds.contains(e))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        edges.sort();
        edges
    }

    /// Fold lines whose bend angle is at most the configured break angle.
    /// Empty when break lines are disabled.
    pub fn break_line_candidates(&self) -> Vec<BreakLine> {
        let settings = self.config.break_lines;
        if !settings.enabled {
            return Vec::new();
        }
        let mut lines: Vec<BreakLine> = self
            .registry
            .pairs()
            .filter(|(_, p)| p.fold)
            .filter_map(|(&edge, pair)| {
                let first = self.registry.face(pair.first.face);
                let second = self.registry.face(pair.second.face);
                let bend_angle = first.normal().angle_to(&second.normal());
                (bend_angle <= settings.break_angle).then(|| {
                    let fin = self.registry.fin(pair.first);
                    BreakLine {
                        edge,
                        start: fin.start(first.transform()),
                        end: fin.end(first.transform()),
                        bend_angle,
                    }
                })
            })
            .collect();
        lines.sort_by_key(|l| l.edge);
        lines
    }

    /// Carry a point drawn on a source face into the layout. `None` when the
    /// face was not placed or the point is off its plane.
    pub fn to_layout(&self, source: FaceId, point: &Point3d) -> Option<Point2d> {
        self.flat_face_for(source)?.to_layout(point, &self.config.tolerance)
    }

    /// Carry a polyline into the layout through the first placed face that
    /// holds both of its endpoints. Returns that face with the mapped points.
    pub fn polyline_to_layout(&self, points: &[Point3d]) -> Option<(FaceId, Vec<Point2d>)> {
        let (first, last) = (points.first()?, points.last()?);
        let tolerance = &self.config.tolerance;
        let (_, face) = self
            .faces()
            .find(|(_, f)| f.contains_point(first, tolerance) && f.contains_point(last, tolerance))?;
        let mapped = points
            .iter()
            .map(|p| face.transform().transform_point(p).to_point2d())
            .collect();
        Some((face.source, mapped))
    }

    /// Layout bounds of every island together.
    pub fn bounding_box(&self) -> BoundingBox {
        self.registry
            .faces()
            .fold(BoundingBox::empty(), |bb, (_, face)| bb.union(&face.bounding_box()))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.registry.diagnostics()
    }

    /// Planar faces never reached: not connected to any seed, or left
    /// behind by cancellation.
    pub fn unreached_faces(&self) -> &[FaceId] {
        &self.unreached
    }

    /// The plane all faces are laid into.
    pub fn paper_plane(&self) -> Plane {
        Plane::xy()
    }
}

/// The first face, in shell order, holding the longest edge of the shell.
fn longest_edge_face(store: &EntityStore, faces: &[FaceId], registry: &Registry) -> Option<FaceId> {
    let mut best: Option<(f64, FaceId)> = None;
    for &face in faces.iter().filter(|&&f| !registry.is_excluded(f)) {
        for loop_id in store.face_loops(face) {
            for &he in &store.loops[loop_id].half_edges {
                let length = store.edge_length(store.half_edges[he].edge);
                if best.is_none_or(|(longest, _)| length > longest) {
                    best = Some((length, face));
                }
            }
        }
    }
    best.map(|(_, face)| face)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unfold_kernel::ShellBuilder;
    use unfold_kernel::geometry::point::Point3d;
    use unfold_kernel::topology::primitives::make_open_box;

    #[test]
    fn test_longest_edge_heuristic_picks_first_holder() {
        let mut store = EntityStore::new();
        let mut b = ShellBuilder::new(&mut store);
        let v = b.add_vertices(&[
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(3.0, 1.0, 0.0),
        ]);
        b.add_face(&[v[0], v[1], v[2]]).unwrap();
        let long = b.add_face(&[v[1], v[3], v[2]]).unwrap();
        let shell = b.finish();
        let faces = store.shell_faces(shell).unwrap().to_vec();
        assert_eq!(longest_edge_face(&store, &faces, &Registry::new()), Some(long));
    }

    #[test]
    fn test_ties_keep_the_first_face() {
        let mut store = EntityStore::new();
        let shell = make_open_box(&mut store, 1.0, 1.0, 1.0).unwrap();
        let faces = store.shell_faces(shell).unwrap().to_vec();
        assert_eq!(longest_edge_face(&store, &faces, &Registry::new()), Some(faces[0]));
    }

    #[test]
    fn test_start_face_must_belong_to_shell() {
        let mut store = EntityStore::new();
        let shell = make_open_box(&mut store, 1.0, 1.0, 1.0).unwrap();
        let other = make_open_box(&mut store, 1.0, 1.0, 1.0).unwrap();
        let foreign = store.shell_faces(other).unwrap()[0];
        let err = FlatPattern::unfold(&store, shell, UnfoldConfig::default().start_face(foreign)).unwrap_err();
        assert_eq!(err, UnfoldError::UnknownStartFace);
    }

    #[test]
    fn test_start_face_is_the_first_seed() {
        let mut store = EntityStore::new();
        let shell = make_open_box(&mut store, 1.0, 2.0, 3.0).unwrap();
        let chosen = store.shell_faces(shell).unwrap()[3];
        let pattern = FlatPattern::unfold(&store, shell, UnfoldConfig::default().start_face(chosen)).unwrap();
        let seed = pattern.bodies()[0].faces()[0];
        assert_eq!(pattern.face(seed).source, chosen);
        assert_eq!(pattern.face(seed).rank, 0);
    }
}
