//! Command-line runner: compares two images, prints every cluster as it is found
//! and writes both images back out with the clusters outlined.

use clap::{Parser, ValueEnum};
use diff_vision::imaging::{annotate, load_rgba, save_rgba};
use diff_vision::{DiffConfig, DiffError, FileConfig, PixelMetric, compare_stream};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    /// Alpha and color channels
    Argb,
    /// Color channels only
    Rgb,
}

impl From<MetricArg> for PixelMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Argb => PixelMetric::Argb,
            MetricArg::Rgb => PixelMetric::Rgb,
        }
    }
}

/// Find and outline the regions where two same-sized images differ.
#[derive(Debug, Parser)]
#[command(name = "diff_vision", version)]
struct Args {
    /// First image to compare
    image_a: PathBuf,
    /// Second image to compare
    image_b: PathBuf,
    /// Where to write the annotated first image
    output_a: PathBuf,
    /// Where to write the annotated second image
    output_b: PathBuf,
    /// TOML file with [diff] and [outline] sections
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    metric: Option<MetricArg>,
    /// Per-pixel distance that must be exceeded
    #[arg(long, allow_negative_numbers = true)]
    tolerance: Option<i64>,
    /// Distance between neighbors examined by the flood fill
    #[arg(long)]
    step: Option<u32>,
    /// Clusters must be larger than this many pixels
    #[arg(long, allow_negative_numbers = true)]
    min_size: Option<i64>,
    /// Report at most this many clusters (0 or negative for no limit)
    #[arg(long, allow_negative_numbers = true)]
    max_clusters: Option<i64>,
    /// Border excluded from comparison on each side
    #[arg(long)]
    margin: Option<u32>,
}

impl Args {
    /// Command-line flags win over the config file.
    fn override_config(&self, mut config: DiffConfig) -> DiffConfig {
        if let Some(metric) = self.metric {
            config.metric = metric.into();
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(min_size) = self.min_size {
            config.min_cluster_size = min_size;
        }
        if let Some(max_clusters) = self.max_clusters {
            config.max_clusters = max_clusters;
        }
        if let Some(margin) = self.margin {
            config.margin = margin;
        }
        config
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("diff_vision: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), DiffError> {
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let config = args.override_config(file_config.diff);
    info!("Diff Vision v{}", diff_vision::VERSION);
    info!(
        ?config,
        "comparing {} and {}",
        args.image_a.display(),
        args.image_b.display()
    );

    let first = Arc::new(load_rgba(&args.image_a)?);
    let second = Arc::new(load_rgba(&args.image_b)?);

    let mut stream = compare_stream(first.clone(), second.clone(), config).await?;
    let mut clusters = Vec::new();
    while let Some(cluster) = stream.next().await {
        println!("{}", cluster);
        clusters.push(cluster);
    }
    stream.join().await?;

    let mut annotated_a = (*first).clone();
    let mut annotated_b = (*second).clone();
    annotate(&mut annotated_a, &clusters, &file_config.outline);
    annotate(&mut annotated_b, &clusters, &file_config.outline);
    save_rgba(&args.output_a, &annotated_a)?;
    save_rgba(&args.output_b, &annotated_b)?;

    info!(
        clusters = clusters.len(),
        "annotated images saved to {} and {}",
        args.output_a.display(),
        args.output_b.display()
    );
    Ok(())
}
