pub mod cancel;
pub mod config;
pub mod error;
pub mod flat_body;
pub mod flat_face;
pub mod flat_fin;
pub mod flat_loop;
pub mod flat_pattern;
pub mod registry;
pub mod survey;

// Re-export key types at crate root for convenience.
pub use cancel::{CancelToken, Cancellation, NeverCancel};
pub use config::{BreakLineConfig, NonPlanarPolicy, UnfoldConfig};
pub use error::{ConfigError, Diagnostic, DiagnosticKind, Outcome, PlacementError, UnfoldError};
pub use flat_body::FlatBody;
pub use flat_face::FlatFace;
pub use flat_fin::FlatFin;
pub use flat_loop::FlatLoop;
pub use flat_pattern::{BreakLine, FlatPattern, UnfoldStats};
pub use registry::{FinRef, FlatFaceId};
pub use survey::{SurfaceSurvey, survey_surfaces};
