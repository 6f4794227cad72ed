// SPDX-License-Identifier: MIT OR Apache-2.0
//! World settings and their RON persistence.

use crate::axis::AxisPlane;
use crate::engine::SleepMode;
use crate::error::{PhysicsError, Result};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings file format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Conventional settings file name
pub const SETTINGS_FILE_NAME: &str = "physics.ron";

/// Simulation world configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Format version
    pub version: u32,
    /// Gravity acceleration in the simulation plane
    pub gravity: DVec2,
    /// Scene plane the simulation runs in. Fixed once the world exists.
    pub axis_plane: AxisPlane,
    /// Maximum fixed sub-steps per frame
    pub max_sub_steps: u32,
    /// Solver iterations per sub-step
    pub solver_iterations: u32,
    /// Solver early-out tolerance (0 runs every iteration)
    pub solver_tolerance: f64,
    /// Sleep policy
    pub sleep_mode: SleepMode,
    /// Solve islands independently
    pub island_split: bool,
    /// Friction for contacts without a material
    pub default_friction: f64,
    /// Record body bounding boxes as debug lines
    pub debug_draw: bool,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            gravity: DVec2::new(0.0, -9.8),
            axis_plane: AxisPlane::XY,
            max_sub_steps: 10,
            solver_iterations: 10,
            solver_tolerance: 0.0,
            sleep_mode: SleepMode::NoSleeping,
            island_split: true,
            default_friction: 0.3,
            debug_draw: false,
        }
    }
}

impl WorldSettings {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        validate_tolerance(self.solver_tolerance)?;
        if self.max_sub_steps == 0 {
            return Err(PhysicsError::InvalidSetting("max_sub_steps must be at least 1".to_string()));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidSetting(format!("gravity {} is not finite", self.gravity)));
        }
        Ok(())
    }

    /// Parse settings from a RON string
    pub fn from_ron(source: &str) -> Result<Self> {
        let settings: WorldSettings = ron::from_str(source)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(PhysicsError::InvalidSetting(format!(
                "Settings version {} is newer than supported version {}",
                settings.version, SETTINGS_FORMAT_VERSION
            )));
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to a RON string
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content)?;
        tracing::info!("Loaded world settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved world settings to {:?}", path);
        Ok(())
    }
}

pub(crate) fn validate_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidSetting(format!(
            "solver_tolerance must be a finite value >= 0, got {tolerance}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = WorldSettings::default();
        assert_eq!(settings.gravity, DVec2::new(0.0, -9.8));
        assert_eq!(settings.axis_plane, AxisPlane::XY);
        assert_eq!(settings.max_sub_steps, 10);
        assert_eq!(settings.solver_iterations, 10);
        assert_eq!(settings.solver_tolerance, 0.0);
        assert_eq!(settings.sleep_mode, SleepMode::NoSleeping);
        assert!(settings.island_split);
        assert_eq!(settings.default_friction, 0.3);
        assert!(!settings.debug_draw);
    }

    #[test]
    fn test_serialization_round_trip() {
        let settings = WorldSettings {
            axis_plane: AxisPlane::XZ,
            sleep_mode: SleepMode::IslandSleeping,
            max_sub_steps: 4,
            ..Default::default()
        };
        let ron_str = settings.to_ron().unwrap();
        assert_eq!(WorldSettings::from_ron(&ron_str).unwrap(), settings);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let settings = WorldSettings::from_ron("(axis_plane: YZ, debug_draw: true)").unwrap();
        assert_eq!(settings.axis_plane, AxisPlane::YZ);
        assert!(settings.debug_draw);
        assert_eq!(settings.max_sub_steps, 10);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = WorldSettings::from_ron("(version: 99)").unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let err = WorldSettings::from_ron("(solver_tolerance: -1.0)").unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidSetting(_)));
    }
}
