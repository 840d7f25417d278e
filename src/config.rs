//! Comparison and annotation configuration.
//!
//! The defaults reproduce the behavior the engine was tuned for: channel-only
//! distance, a tolerance of 8, single-pixel steps, clusters of more than 150
//! pixels and no cap on how many are reported.

use crate::core_modules::cluster_detector::cluster_detector::ClusterOptions;
use crate::core_modules::difference_mask::difference_mask::Tolerance;
use crate::core_modules::pixel_metric::pixel_metric::PixelMetric;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Tolerances under this value flag so many pixels on noisy or compressed
/// images that clusters can grow to cover most of the frame.
pub const LOW_TOLERANCE_WARNING: Tolerance = 5;

/// Configuration for a single comparison run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Which channels contribute to the per-pixel distance.
    pub metric: PixelMetric,
    /// A pixel is different when its distance is strictly greater than this.
    /// Smaller is more sensitive; any negative value flags every scanned pixel.
    pub tolerance: Tolerance,
    /// How far apart, in pixels, each flood fill step reaches. Must be at least 1.
    pub step: u32,
    /// Clusters are kept only when they have strictly more pixels than this.
    /// Zero or negative keeps every cluster.
    pub min_cluster_size: i64,
    /// Maximum number of clusters to report. Zero or negative means unlimited.
    pub max_clusters: i64,
    /// Border, in pixels, excluded from comparison on every side.
    pub margin: u32,
    /// Build the difference mask across all cores.
    pub parallel_mask: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            metric: PixelMetric::Rgb,
            tolerance: 8,
            step: 1,
            min_cluster_size: 150,
            max_clusters: 0,
            margin: 5,
            parallel_mask: true,
        }
    }
}

impl DiffConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step == 0 {
            return Err(ConfigError::InvalidStep);
        }
        if self.tolerance < LOW_TOLERANCE_WARNING {
            warn!(
                tolerance = self.tolerance,
                "low tolerance, expect very large clusters on noisy images"
            );
        }
        Ok(())
    }

    /// The cluster cap, or `None` when unlimited.
    pub fn cluster_limit(&self) -> Option<usize> {
        if self.max_clusters > 0 {
            Some(self.max_clusters as usize)
        } else {
            None
        }
    }

    /// Extraction options derived from this configuration.
    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            step: self.step,
            min_cluster_size: usize::try_from(self.min_cluster_size).unwrap_or(0),
            limit: self.cluster_limit(),
        }
    }
}

/// How cluster rectangles are drawn onto annotated images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineStyle {
    /// Space left between the cluster's bounding box and the drawn rectangle.
    pub padding: u32,
    /// Pen width in pixels.
    pub thickness: u32,
    /// RGBA pen color.
    pub color: [u8; 4],
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            padding: 5,
            thickness: 5,
            color: [255, 0, 0, 255],
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid step size (must be at least 1)")]
    InvalidStep,
    #[error("failed to read config file: {0}")]
    FileRead(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub outline: OutlineStyle,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.diff.validate()?;
        Ok(config)
    }
}
