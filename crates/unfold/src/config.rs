//! Configuration for an unfold run.

use serde::{Deserialize, Serialize};
use unfold_kernel::FaceId;
use unfold_kernel::Tolerance;

use crate::error::ConfigError;

/// What to do when the shell contains faces that cannot be laid flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonPlanarPolicy {
    /// Refuse the whole shell, listing every offending face.
    #[default]
    Abort,
    /// Leave the offending faces out and unfold the rest.
    Skip,
}

/// Parameters for marking fold lines as break lines. Stored for the
/// rendering stage; the unfolder only classifies candidate edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakLineConfig {
    pub enabled: bool,
    /// Largest angle (radians) between the two faces' normals that still
    /// gets a break line. Shallow folds get one, sharp creases do not.
    pub break_angle: f64,
    /// Dash length for rendered break lines; zero means a solid line.
    pub dash_size: f64,
}

impl Default for BreakLineConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl BreakLineConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            break_angle: 0.0,
            dash_size: 0.0,
        }
    }

    pub fn new(break_angle: f64, dash_size: f64) -> Self {
        Self {
            enabled: true,
            break_angle,
            dash_size,
        }
    }

    /// Disabled break lines carry no angle or dash size.
    pub fn normalized(self) -> Self {
        if self.enabled { self } else { Self::disabled() }
    }
}

/// Configuration controlling seeding, collision checks, and break lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnfoldConfig {
    /// Seed face override. Face keys only make sense for one store, so this
    /// is never serialized.
    #[serde(skip)]
    pub start_face: Option<FaceId>,
    /// Test every candidate face against its island before committing it.
    pub detect_collisions: bool,
    pub non_planar: NonPlanarPolicy,
    pub break_lines: BreakLineConfig,
    pub tolerance: Tolerance,
}

impl Default for UnfoldConfig {
    fn default() -> Self {
        Self {
            start_face: None,
            detect_collisions: false,
            non_planar: NonPlanarPolicy::Abort,
            break_lines: BreakLineConfig::disabled(),
            tolerance: Tolerance::default(),
        }
    }
}

impl UnfoldConfig {
    /// Collision-checked unfolding: overlapping faces go to new islands.
    pub fn with_collisions() -> Self {
        Self {
            detect_collisions: true,
            ..Self::default()
        }
    }

    pub fn start_face(mut self, face: FaceId) -> Self {
        self.start_face = Some(face);
        self
    }

    pub fn detect_collisions(mut self, enabled: bool) -> Self {
        self.detect_collisions = enabled;
        self
    }

    pub fn non_planar(mut self, policy: NonPlanarPolicy) -> Self {
        self.non_planar = policy;
        self
    }

    pub fn break_lines(mut self, break_lines: BreakLineConfig) -> Self {
        self.break_lines = break_lines.normalized();
        self
    }

    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Load from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.break_lines = config.break_lines.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Lengths are bucketed on the coincidence grid, so it must be a
    /// positive finite step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance.is_valid() {
            Ok(())
        } else {
            Err(ConfigError::InvalidTolerance(self.tolerance))
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UnfoldConfig::default();
        assert!(!config.detect_collisions);
        assert_eq!(config.non_planar, NonPlanarPolicy::Abort);
        assert!(!config.break_lines.enabled);
        assert!(UnfoldConfig::with_collisions().detect_collisions);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = UnfoldConfig::from_json(r#"{ "detect_collisions": true, "non_planar": "skip" }"#).unwrap();
        assert!(config.detect_collisions);
        assert_eq!(config.non_planar, NonPlanarPolicy::Skip);
        assert_eq!(config.tolerance, Tolerance::default());
        assert!(config.start_face.is_none());
    }

    #[test]
    fn test_disabled_break_lines_are_zeroed() {
        let json = r#"{ "break_lines": { "enabled": false, "break_angle": 0.5, "dash_size": 2.0 } }"#;
        let config = UnfoldConfig::from_json(json).unwrap();
        assert_eq!(config.break_lines, BreakLineConfig::disabled());

        let config = UnfoldConfig::default().break_lines(BreakLineConfig {
            enabled: false,
            break_angle: 1.0,
            dash_size: 1.0,
        });
        assert_eq!(config.break_lines.break_angle, 0.0);
    }

    #[test]
    fn test_json_round_trip_keeps_settings() {
        let config = UnfoldConfig::with_collisions().break_lines(BreakLineConfig::new(0.3, 1.5));
        let back = UnfoldConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            UnfoldConfig::from_json("{ detect_collisions: yes }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_tolerance() {
        for coincidence in ["0.0", "-1e-7"] {
            let json = format!(r#"{{ "tolerance": {{ "coincidence": {coincidence}, "angular": 1e-10 }} }}"#);
            assert!(matches!(
                UnfoldConfig::from_json(&json),
                Err(ConfigError::InvalidTolerance(_))
            ));
        }
        let tight = Tolerance {
            coincidence: 1e-9,
            angular: 1e-12,
        };
        assert!(UnfoldConfig::default().tolerance(tight).validate().is_ok());
    }
}
