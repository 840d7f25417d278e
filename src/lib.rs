// THEORY:
// This file is the main entry point for the `diff_vision` library crate. It
// compares two images of the same size and reports the rectangular regions where
// they differ, as clusters of connected differing pixels.
//
// The engine is layered:
// 1.  **Pixel Layer** (`core_modules::pixel`, `core_modules::pixel_metric`): what a
//     pixel is, how the engine reads images, and how far apart two pixels are.
// 2.  **Difference Layer** (`core_modules::difference_mask`): a boolean grid of the
//     positions whose distance exceeds the tolerance, minus a border margin.
// 3.  **Spatial Grouping Layer** (`core_modules::cluster_detector`,
//     `core_modules::cluster`): connected flagged positions, reduced to bounding
//     boxes and sizes, filtered by size and capped in number.
//
// `pipeline` (eager and lazy) and `stream` (async) are the public faces of the
// engine. `imaging` is the boundary to real image files and is the only place
// that knows about file formats or drawing.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod imaging;
pub mod pipeline;
pub mod stream;

pub use config::{ConfigError, DiffConfig, FileConfig, OutlineStyle};
pub use core_modules::cluster::{BoundingBox, Cluster, Point};
pub use core_modules::cluster_detector::cluster_detector::{
    ClusterOptions, ClusterScan, find_clusters,
};
pub use core_modules::difference_mask::difference_mask::{DifferenceMask, Tolerance};
pub use core_modules::pixel::pixel::{Pixel, PixelBuffer, RgbaFrame};
pub use core_modules::pixel_metric::pixel_metric::PixelMetric;
pub use error::DiffError;
pub use pipeline::DiffPipeline;
pub use stream::{ClusterStream, compare_stream};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
