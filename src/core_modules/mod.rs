pub mod cluster;
pub mod cluster_detector;
pub mod difference_mask;
pub mod pixel;
pub mod pixel_metric;
