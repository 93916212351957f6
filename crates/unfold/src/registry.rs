//! State shared by every island of one unfold run: the flat-face arena, the
//! placed-face index, and the edge pairing index.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use slotmap::{SlotMap, new_key_type};
use tracing::warn;
use unfold_kernel::{EdgeId, FaceId};

use crate::error::{Diagnostic, DiagnosticKind};
use crate::flat_face::FlatFace;
use crate::flat_fin::FlatFin;

new_key_type! {
    pub struct FlatFaceId;
}

/// Position of a fin inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FinRef {
    pub face: FlatFaceId,
    pub loop_index: usize,
    pub fin_index: usize,
}

/// The two fins of a shared edge once both faces are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinPair {
    pub first: FinRef,
    pub second: FinRef,
    /// Joined by propagation inside one island rather than merely both placed.
    pub fold: bool,
}

impl FinPair {
    pub fn other(&self, fin: FinRef) -> Option<FinRef> {
        if fin == self.first {
            Some(self.second)
        } else if fin == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    faces: SlotMap<FlatFaceId, FlatFace>,
    placed: HashMap<FaceId, FlatFaceId>,
    pairs: HashMap<EdgeId, FinPair>,
    excluded: HashSet<FaceId>,
    diagnostics: Vec<Diagnostic>,
    next_rank: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next creation rank. Every candidate takes one, placed or not.
    pub(crate) fn next_rank(&mut self) -> u64 {
        let rank = self.next_rank;
        self.next_rank += 1;
        rank
    }

    /// Record a face as placed. A source face is placed at most once.
    pub(crate) fn commit(&mut self, face: FlatFace) -> FlatFaceId {
        debug_assert!(!self.placed.contains_key(&face.source), "face placed twice");
        let source = face.source;
        let id = self.faces.insert(face);
        self.placed.insert(source, id);
        id
    }

    pub fn is_placed(&self, face: FaceId) -> bool {
        self.placed.contains_key(&face)
    }

    pub fn is_excluded(&self, face: FaceId) -> bool {
        self.excluded.contains(&face)
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Neither placed nor given up on.
    pub fn is_claimable(&self, face: FaceId) -> bool {
        !self.is_placed(face) && !self.is_excluded(face)
    }

    /// Give up on a face for the rest of the run.
    pub(crate) fn skip(&mut self, face: FaceId, kind: DiagnosticKind) {
        warn!(?face, ?kind, "face skipped");
        self.excluded.insert(face);
        self.diagnostics.push(Diagnostic { face, kind });
    }

    /// Note a problem with a face that stays placed.
    pub(crate) fn report(&mut self, face: FaceId, kind: DiagnosticKind) {
        warn!(?face, ?kind, "face diagnostic");
        self.diagnostics.push(Diagnostic { face, kind });
    }

    pub(crate) fn link(&mut self, edge: EdgeId, first: FinRef, second: FinRef, fold: bool) {
        if self.pairs.contains_key(&edge) {
            return;
        }
        self.pairs.insert(edge, FinPair { first, second, fold });
        if fold {
            self.fin_mut(first).is_internal = true;
            self.fin_mut(second).is_internal = true;
        }
    }

    pub fn face(&self, id: FlatFaceId) -> &FlatFace {
        &self.faces[id]
    }

    pub fn faces(&self) -> impl Iterator<Item = (FlatFaceId, &FlatFace)> {
        self.faces.iter()
    }

    pub fn placed(&self, source: FaceId) -> Option<FlatFaceId> {
        self.placed.get(&source).copied()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn fin(&self, fin: FinRef) -> &FlatFin {
        &self.faces[fin.face].loops()[fin.loop_index].fins[fin.fin_index]
    }

    fn fin_mut(&mut self, fin: FinRef) -> &mut FlatFin {
        &mut self.faces[fin.face].loops_mut()[fin.loop_index].fins[fin.fin_index]
    }

    pub fn pair(&self, edge: EdgeId) -> Option<&FinPair> {
        self.pairs.get(&edge)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&EdgeId, &FinPair)> {
        self.pairs.iter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
