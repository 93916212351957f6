use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};
use unfold_kernel::{EntityStore, FaceId, ShellId, TopologyError};

/// Tally of the surface kinds carrying a shell's faces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurfaceSurvey {
    /// Face count per surface kind, keyed by kind name.
    pub counts: BTreeMap<&'static str, usize>,
    /// Faces that cannot be laid flat, in shell order.
    pub non_planar: Vec<FaceId>,
}

impl SurfaceSurvey {
    pub fn is_all_planar(&self) -> bool {
        self.non_planar.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Count faces per surface kind and collect the non-planar ones.
#[instrument(skip(store))]
pub fn survey_surfaces(store: &EntityStore, shell: ShellId) -> Result<SurfaceSurvey, TopologyError> {
    let mut survey = SurfaceSurvey::default();
    for &face_id in store.shell_faces(shell)? {
        let surface = &store.faces[face_id].surface;
        *survey.counts.entry(surface.kind()).or_default() += 1;
        if !surface.is_planar() {
            survey.non_planar.push(face_id);
        }
    }
    debug!(counts = ?survey.counts, non_planar = survey.non_planar.len(), "surface survey");
    Ok(survey)
}
