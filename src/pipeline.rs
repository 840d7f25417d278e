// THEORY:
// The `pipeline` module is the top-level synchronous API of the comparison engine.
// It wires a validated `DiffConfig` to the two analysis layers:
//
//   two PixelBuffers ─► DifferenceMask ─► ClusterScan ─► Clusters
//
// `compare` runs the whole pass and hands back every accepted cluster at once.
// `compare_lazy` builds the mask and returns the scan itself, so the caller pulls
// clusters one at a time and may stop whenever it has seen enough.

use crate::config::{ConfigError, DiffConfig};
use crate::core_modules::cluster_detector::cluster_detector::ClusterScan;
use crate::core_modules::difference_mask::difference_mask::DifferenceMask;
use crate::core_modules::pixel::pixel::PixelBuffer;
use tracing::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::cluster::{BoundingBox, Cluster, Point};
pub use crate::error::DiffError;

/// The main, top-level struct for synchronous comparisons.
#[derive(Debug, Clone)]
pub struct DiffPipeline {
    config: DiffConfig,
}

impl DiffPipeline {
    /// Validates `config` and builds a pipeline around it.
    pub fn new(config: DiffConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Stage 1 on its own: flags the positions where the two buffers disagree.
    pub fn difference_mask<A, B>(&self, first: &A, second: &B) -> Result<DifferenceMask, DiffError>
    where
        A: PixelBuffer + Sync + ?Sized,
        B: PixelBuffer + Sync + ?Sized,
    {
        build_mask(first, second, &self.config)
    }

    /// Compares two buffers and returns every accepted cluster in scan order.
    pub fn compare<A, B>(&self, first: &A, second: &B) -> Result<Vec<Cluster>, DiffError>
    where
        A: PixelBuffer + Sync + ?Sized,
        B: PixelBuffer + Sync + ?Sized,
    {
        let clusters: Vec<Cluster> = self
            .compare_lazy(first, second)?
            .inspect(|cluster| debug!(%cluster, "cluster found"))
            .collect();
        info!(clusters = clusters.len(), "comparison complete");
        Ok(clusters)
    }

    /// Builds the mask now and returns a scan that yields clusters on demand.
    pub fn compare_lazy<A, B>(&self, first: &A, second: &B) -> Result<ClusterScan, DiffError>
    where
        A: PixelBuffer + Sync + ?Sized,
        B: PixelBuffer + Sync + ?Sized,
    {
        let mask = build_mask(first, second, &self.config)?;
        Ok(ClusterScan::new(mask, self.config.cluster_options()))
    }
}

/// Builds a difference mask according to `config`, logging its statistics.
pub(crate) fn build_mask<A, B>(
    first: &A,
    second: &B,
    config: &DiffConfig,
) -> Result<DifferenceMask, DiffError>
where
    A: PixelBuffer + Sync + ?Sized,
    B: PixelBuffer + Sync + ?Sized,
{
    let (metric, tolerance, margin) = (config.metric, config.tolerance, config.margin);
    let mask = if config.parallel_mask {
        DifferenceMask::build_parallel(first, second, metric, tolerance, margin)?
    } else {
        DifferenceMask::build(first, second, metric, tolerance, margin)?
    };
    debug!(
        width = mask.width(),
        height = mask.height(),
        flagged = mask.count(),
        margin = mask.margin(),
        ?metric,
        tolerance,
        "difference mask built"
    );
    Ok(mask)
}
