use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use tracing::{debug, trace};
use unfold_kernel::{EdgeId, EntityStore, FaceId, Footprint, PlanarRegion, RegionBoolean};

use crate::cancel::Cancellation;
use crate::config::UnfoldConfig;
use crate::error::{DiagnosticKind, PlacementError, UnfoldError};
use crate::flat_face::FlatFace;
use crate::registry::{FinRef, FlatFaceId, Registry};

/// Read-only collaborators of one unfold run.
pub(crate) struct Env<'a> {
    pub store: &'a EntityStore,
    pub config: &'a UnfoldConfig,
    pub regions: &'a dyn RegionBoolean,
    pub cancel: &'a dyn Cancellation,
}

/// An unmatched fin on the island frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFin {
    length_key: i64,
    rank: u64,
    fin: FinRef,
    edge: EdgeId,
    neighbor: FaceId,
}

impl Ord for OpenFin {
    /// Max-heap order: longer edges first, then the earlier-created face,
    /// then the earlier fin position.
    fn cmp(&self, other: &Self) -> Ordering {
        self.length_key
            .cmp(&other.length_key)
            .then_with(|| other.rank.cmp(&self.rank))
            .then_with(|| other.fin.cmp(&self.fin))
    }
}

impl PartialOrd for OpenFin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a face joins its island.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Hinge {
    /// The placed fin the face was laid against.
    pub base: FinRef,
    /// The face's own fin on the same edge.
    pub own: (usize, usize),
    /// Propagated within the island (a fold) rather than seeded from another.
    pub fold: bool,
}

/// What an island left behind when its frontier ran dry.
#[derive(Debug, Default)]
pub(crate) struct Growth {
    /// Fins whose far face collided with the island.
    pub deferred: Vec<FinRef>,
    pub cancelled: bool,
}

/// One island: faces laid out together without overlap (when checked).
#[derive(Debug)]
pub struct FlatBody {
    index: usize,
    faces: Vec<FlatFaceId>,
    open_fins: BinaryHeap<OpenFin>,
    footprint: Option<Footprint>,
}

impl FlatBody {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            faces: Vec::new(),
            open_fins: BinaryHeap::new(),
            footprint: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Faces in placement order; the first is the seed.
    pub fn faces(&self) -> &[FlatFaceId] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Accumulated layout region; `None` unless collisions are checked.
    pub fn footprint(&self) -> Option<&Footprint> {
        self.footprint.as_ref()
    }

    /// Start the island with `face`. The face is always placed; when its
    /// region cannot be built or united the island is left without a
    /// footprint and reports the failure against the face.
    pub(crate) fn seed(
        &mut self,
        env: &Env,
        registry: &mut Registry,
        face: FlatFace,
        hinge: Option<Hinge>,
    ) -> FlatFaceId {
        if env.config.detect_collisions {
            let source = face.source;
            if let Err(reason) = build_region(env, &face).and_then(|region| self.extend_footprint(env, &region)) {
                registry.report(source, DiagnosticKind::GeometryConstructionFailure { reason });
            }
        }
        self.add_face(env, registry, face, hinge)
    }

    /// Commit a face whose region, if any, is already in the footprint:
    /// register it, pair fins with already placed neighbours, and refresh
    /// the frontier.
    fn add_face(&mut self, env: &Env, registry: &mut Registry, face: FlatFace, hinge: Option<Hinge>) -> FlatFaceId {
        let source = face.source;
        let rank = face.rank;
        let id = registry.commit(face);
        self.faces.push(id);

        if let Some(h) = hinge {
            let own = FinRef {
                face: id,
                loop_index: h.own.0,
                fin_index: h.own.1,
            };
            registry.link(registry.fin(own).edge, h.base, own, h.fold);
        }

        let mut touched = HashSet::new();
        let mut links = Vec::new();
        for ((loop_index, fin_index), fin) in registry.face(id).fins() {
            let Some(neighbor) = fin.neighbor else {
                continue;
            };
            let fin_ref = FinRef {
                face: id,
                loop_index,
                fin_index,
            };
            touched.insert(fin.edge);
            if let Some(other) = registry.placed(neighbor) {
                if let Some(pos) = registry.face(other).fin_for_edge(fin.edge) {
                    let other_ref = FinRef {
                        face: other,
                        loop_index: pos.0,
                        fin_index: pos.1,
                    };
                    links.push((fin.edge, other_ref, fin_ref));
                }
            } else if !registry.is_excluded(neighbor) {
                self.open_fins.push(OpenFin {
                    length_key: env.config.tolerance.length_key(fin.length),
                    rank,
                    fin: fin_ref,
                    edge: fin.edge,
                    neighbor,
                });
            }
        }
        for (edge, first, second) in links {
            registry.link(edge, first, second, false);
        }
        // An edge stays open only from the side still waiting for its partner.
        self.open_fins.retain(|o| o.fin.face == id || !touched.contains(&o.edge));
        debug!(body = self.index, face = ?source, rank, open = self.open_fins.len(), "face committed");
        id
    }

    /// Repeatedly place the face across the best open fin until the frontier
    /// is empty or cancellation is requested.
    pub(crate) fn grow(&mut self, env: &Env, registry: &mut Registry) -> Result<Growth, UnfoldError> {
        let mut growth = Growth::default();
        while let Some(open) = self.open_fins.pop() {
            if !registry.is_claimable(open.neighbor) {
                continue;
            }
            if env.cancel.is_cancelled() {
                debug!(body = self.index, "cancellation requested");
                growth.cancelled = true;
                break;
            }

            let rank = registry.next_rank();
            let at = (open.fin.loop_index, open.fin.fin_index);
            let placed = FlatFace::across(
                env.store,
                open.neighbor,
                self.index,
                rank,
                registry.face(open.fin.face),
                at,
                &env.config.tolerance,
            );
            let (candidate, own) = match placed {
                Ok(placed) => placed,
                Err(PlacementError::Topology(err)) => return Err(err.into()),
                Err(err) => {
                    registry.skip(open.neighbor, placement_diagnostic(&err, open.edge));
                    continue;
                }
            };

            if env.config.detect_collisions {
                let region = match build_region(env, &candidate) {
                    Ok(region) => region,
                    Err(reason) => {
                        registry.skip(open.neighbor, DiagnosticKind::GeometryConstructionFailure { reason });
                        continue;
                    }
                };
                let Some(footprint) = self.footprint.as_ref().filter(|f| !f.is_empty()) else {
                    debug!(body = self.index, face = ?open.neighbor, "island has no footprint; deferred");
                    growth.deferred.push(open.fin);
                    continue;
                };
                if env.regions.interferes(footprint, &region) {
                    debug!(body = self.index, face = ?open.neighbor, edge = ?open.edge, "candidate interferes; deferred");
                    growth.deferred.push(open.fin);
                    continue;
                }
                if let Err(reason) = self.extend_footprint(env, &region) {
                    registry.skip(open.neighbor, DiagnosticKind::GeometryConstructionFailure { reason });
                    continue;
                }
            }

            trace!(face = ?open.neighbor, edge = ?open.edge, "unfolding across edge");
            let hinge = Hinge {
                base: open.fin,
                own,
                fold: true,
            };
            self.add_face(env, registry, candidate, Some(hinge));
        }
        Ok(growth)
    }

    /// Union `region` into the footprint. The footprint is unchanged on error.
    fn extend_footprint(&mut self, env: &Env, region: &PlanarRegion) -> Result<(), String> {
        let footprint = self.footprint.get_or_insert_with(Footprint::new);
        env.regions.unite(footprint, region).map_err(|e| e.to_string())
    }
}

fn build_region(env: &Env, face: &FlatFace) -> Result<PlanarRegion, String> {
    env.regions
        .build_region(&face.outer_ring(), &face.hole_rings())
        .map_err(|e| e.to_string())
}

pub(crate) fn placement_diagnostic(err: &PlacementError, edge: EdgeId) -> DiagnosticKind {
    match err {
        PlacementError::NonPlanar(_) => DiagnosticKind::NonPlanarSkipped,
        _ => DiagnosticKind::DegeneratePlacement { edge },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn open(length_key: i64, rank: u64, fin_index: usize) -> OpenFin {
        OpenFin {
            length_key,
            rank,
            fin: FinRef {
                face: FlatFaceId::from(KeyData::from_ffi(1)),
                loop_index: 0,
                fin_index,
            },
            edge: EdgeId::default(),
            neighbor: FaceId::default(),
        }
    }

    #[test]
    fn test_longest_fin_pops_first() {
        let mut heap = BinaryHeap::new();
        heap.push(open(10, 0, 0));
        heap.push(open(30, 5, 0));
        heap.push(open(20, 1, 0));
        assert_eq!(heap.pop().unwrap().length_key, 30);
        assert_eq!(heap.pop().unwrap().length_key, 20);
    }

    #[test]
    fn test_equal_lengths_prefer_lower_rank_then_position() {
        let mut heap = BinaryHeap::new();
        heap.push(open(10, 3, 0));
        heap.push(open(10, 1, 2));
        heap.push(open(10, 1, 1));
        let first = heap.pop().unwrap();
        assert_eq!((first.rank, first.fin.fin_index), (1, 1));
        let second = heap.pop().unwrap();
        assert_eq!((second.rank, second.fin.fin_index), (1, 2));
        assert_eq!(heap.pop().unwrap().rank, 3);
    }
}
