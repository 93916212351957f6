use serde::Serialize;
use thiserror::Error;
use unfold_kernel::{EdgeId, FaceId, Tolerance, TopologyError};

/// Fatal conditions: the unfold is refused and nothing is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnfoldError {
    #[error("edge {edge:?} is shared by {face_count} faces; unfolding needs at most two")]
    Adjacency { edge: EdgeId, face_count: usize },

    #[error("{} face(s) are not planar", faces.len())]
    UnsupportedGeometry { faces: Vec<FaceId> },

    #[error("shell has no faces")]
    EmptyShell,

    #[error("start face is not part of the shell")]
    UnknownStartFace,

    #[error("seed face {face:?} has no edge long enough to anchor it")]
    DegenerateSeed { face: FaceId },

    #[error("tolerance must be positive and finite, got coincidence {} and angular {}", .0.coincidence, .0.angular)]
    InvalidTolerance(Tolerance),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Problems loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tolerance must be positive and finite, got coincidence {} and angular {}", .0.coincidence, .0.angular)]
    InvalidTolerance(Tolerance),
}

/// Why a single face could not be laid out next to a placed neighbour.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("face {0:?} is not planar")]
    NonPlanar(FaceId),

    #[error("edge {0:?} is too short to orient a face")]
    DegenerateEdge(EdgeId),

    #[error("face {face:?} does not use edge {edge:?}")]
    UnmatchedEdge { face: FaceId, edge: EdgeId },

    #[error("face {0:?} has no edge long enough to anchor it")]
    NoAnchor(FaceId),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// A non-fatal finding reported alongside the unfolded result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub face: FaceId,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticKind {
    /// The flattened boundary could not be built or merged into the island
    /// footprint.
    GeometryConstructionFailure { reason: String },
    /// The face is curved and was left out under `NonPlanarPolicy::Skip`.
    NonPlanarSkipped,
    /// No usable frame could be built across this edge.
    DegeneratePlacement { edge: EdgeId },
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Complete,
    /// Stopped on request; the islands committed so far are kept.
    Cancelled,
}
