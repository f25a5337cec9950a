//! View configuration.
//!
//! Every field has a default, so a config file only needs to name the values
//! it overrides.

use crate::viz::geometry::RollMetrics;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Display settings of the visualizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tokens per grid page.
    pub page_size: usize,
    /// Tokens per grid row.
    pub chunk_size: usize,
    /// Piano roll canvas scale.
    pub roll: RollMetrics,
    /// Initial horizontal zoom: canvas pixels per terminal column.
    pub pixels_per_column: f64,
    /// Width of one token block in terminal columns.
    pub token_block_width: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 140,
            chunk_size: 14,
            roll: RollMetrics::default(),
            pixels_per_column: 10.0,
            token_block_width: 5,
        }
    }
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or holds
    /// an out-of-range value
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every size and scale is usable.
    ///
    /// # Errors
    ///
    /// Returns the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        if self.page_size == 0 {
            return invalid("page_size", "must be at least 1");
        }
        if self.chunk_size == 0 {
            return invalid("chunk_size", "must be at least 1");
        }
        if !positive(self.roll.note_row_height) {
            return invalid("roll.note_row_height", "must be positive");
        }
        if !positive(self.roll.time_scale) {
            return invalid("roll.time_scale", "must be positive");
        }
        if !non_negative(self.roll.keyboard_width) {
            return invalid("roll.keyboard_width", "must not be negative");
        }
        if !non_negative(self.roll.min_grid_width) {
            return invalid("roll.min_grid_width", "must not be negative");
        }
        if !positive(self.pixels_per_column) {
            return invalid("pixels_per_column", "must be positive");
        }
        if self.token_block_width < 2 {
            return invalid("token_block_width", "must be at least 2");
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 140);
        assert_eq!(config.chunk_size, 14);
        assert_eq!(config.roll.keyboard_width, 85.0);
    }

    #[test]
    fn test_partial_override() {
        let config: Config =
            serde_json::from_str(r#"{"page_size": 56, "roll": {"time_scale": 0.25}}"#).unwrap();
        assert_eq!(config.page_size, 56);
        assert_eq!(config.chunk_size, 14);
        assert_eq!(config.roll.time_scale, 0.25);
        assert_eq!(config.roll.note_row_height, 20.0);
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let config = Config {
            chunk_size: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "chunk_size",
                ..
            })
        ));

        let mut config = Config::default();
        config.roll.time_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.roll.note_row_height = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/miditok-viz.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("miditok-viz-{}.json", std::process::id()));
        fs::write(&path, r#"{"pixels_per_column": 4}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.pixels_per_column, 4.0);
        fs::remove_file(&path).unwrap();

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        fs::remove_file(&path).unwrap();
    }
}
