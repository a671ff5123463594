//! Generation and streaming constants plus the runtime `StreamingConfig`.
//!
//! The constants are the defaults; `StreamingConfig` carries the subset that
//! can be overridden at startup from a JSON file.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Viewer displacement (world units) that triggers a new generation window.
pub const DETAIL_DISTANCE: f32 = 2.0;
/// Cells generated on each side of the window center.
pub const CELL_RADIUS: u32 = 8;
/// Brush props placed in every cell.
pub const BRUSH_PER_CELL: u32 = 25;
/// Rock props placed in every cell.
pub const ROCKS_PER_CELL: u32 = 20;

/// Length along z covered by the road and cliff strips of one window.
pub const WINDOW_LENGTH: f64 = 16.0;
/// Height of the cliff face above and below the path.
pub const CLIFF_HEIGHT: f64 = 8.0;

pub const ROAD_ROWS: usize = 2;
pub const ROAD_COLS: usize = 64;
pub const CLIFF_ROWS: usize = 32;
pub const CLIFF_COLS: usize = 64;
pub const ROCK_GRID: usize = 6;

/// Number of samples in the road height map.
pub const ROAD_MAP_LEN: usize = 128;
/// Side length of the square cliff surface map.
pub const CLIFF_MAP_SIZE: usize = 128;

/// Eye height of the viewer above the path.
pub const VIEWER_HEIGHT: f32 = 0.25;
/// Lateral clamp of the viewer relative to the cliff surface.
pub const VIEWER_MAX_OFFSET: f32 = 0.4;
pub const VIEWER_MIN_OFFSET: f32 = -0.5;

/// Startup options recognized by the streaming pipeline.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamingConfig {
    /// Displacement that triggers regeneration.
    pub detail_distance: f32,
    /// Cells generated on each side of the window center.
    pub cell_radius: u32,
    pub brush_per_cell: u32,
    pub rocks_per_cell: u32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            detail_distance: DETAIL_DISTANCE,
            cell_radius: CELL_RADIUS,
            brush_per_cell: BRUSH_PER_CELL,
            rocks_per_cell: ROCKS_PER_CELL,
        }
    }
}

impl StreamingConfig {
    /// Parse a config from JSON. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.detail_distance.is_finite() || self.detail_distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "detailDistance must be a non-negative finite number, got {}",
                self.detail_distance
            )));
        }
        if self.cell_radius == 0 {
            return Err(ConfigError::Invalid(
                "cellRadius must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let config = StreamingConfig::default();
        assert_eq!(config.detail_distance, DETAIL_DISTANCE);
        assert_eq!(config.cell_radius, CELL_RADIUS);
        assert_eq!(config.brush_per_cell, BRUSH_PER_CELL);
        assert_eq!(config.rocks_per_cell, ROCKS_PER_CELL);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = StreamingConfig::from_json_str(r#"{"cellRadius": 4}"#).unwrap();
        assert_eq!(config.cell_radius, 4);
        assert_eq!(config.detail_distance, DETAIL_DISTANCE);
        assert_eq!(config.rocks_per_cell, ROCKS_PER_CELL);
    }

    #[test]
    fn test_all_recognized_options() {
        let json = r#"{"detailDistance": 3.5, "cellRadius": 2, "brushPerCell": 5, "rocksPerCell": 0}"#;
        let config = StreamingConfig::from_json_str(json).unwrap();
        assert_eq!(
            config,
            StreamingConfig {
                detail_distance: 3.5,
                cell_radius: 2,
                brush_per_cell: 5,
                rocks_per_cell: 0,
            }
        );
    }

    #[test]
    fn test_rejects_zero_radius() {
        let err = StreamingConfig::from_json_str(r#"{"cellRadius": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn test_rejects_negative_distance() {
        let err = StreamingConfig::from_json_str(r#"{"detailDistance": -1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = StreamingConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)), "got {err:?}");
    }
}
