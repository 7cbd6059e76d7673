//! Command-line driver for the spot engine.
//!
//! Loads an image, crops the requested region, finds dark spots and prints
//! the groups they form. Optionally searches for the best threshold first and
//! prints the group count at every threshold of the diagnostic sweep.
//!
//! ```bash
//! cargo run -p spot_tester -- plate.png --x-start 100 --x-end 400 --auto --profile
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use spot_vision::core_modules::image_helper::image_helper::intensity_matrix;
use spot_vision::core_modules::region::Region;
use spot_vision::parallel_sweep::{ParallelSweep, SweepOutcome};
use spot_vision::pipeline::{
    AnalysisSession, DEFAULT_GROUP_DIAMETER, DEFAULT_MAX_AREA, DEFAULT_MIN_AREA, PipelineConfig, SpotPipeline,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to analyze; color images are reduced to luma
    input: PathBuf,

    /// Left edge of the analysis region (inclusive)
    #[arg(long, default_value_t = 0)]
    x_start: usize,

    /// Right edge of the analysis region (exclusive, defaults to image width)
    #[arg(long)]
    x_end: Option<usize>,

    /// Top edge of the analysis region (inclusive)
    #[arg(long, default_value_t = 0)]
    y_start: usize,

    /// Bottom edge of the analysis region (exclusive, defaults to image height)
    #[arg(long)]
    y_end: Option<usize>,

    /// Smallest spot area in pixels
    #[arg(long, default_value_t = DEFAULT_MIN_AREA)]
    min_area: usize,

    /// Largest spot area in pixels
    #[arg(long, default_value_t = DEFAULT_MAX_AREA)]
    max_area: usize,

    /// Group diameter in pixels
    #[arg(short, long, default_value_t = DEFAULT_GROUP_DIAMETER)]
    diameter: f64,

    /// Intensity threshold; pixels strictly darker are foreground
    #[arg(short, long)]
    threshold: Option<i32>,

    /// Search for the threshold with the most groups before detecting
    #[arg(long)]
    auto: bool,

    /// Print the group count at every threshold of the diagnostic sweep
    #[arg(long)]
    profile: bool,

    /// Time limit for the profile sweep in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Print every spot, not just the group summary
    #[arg(long)]
    spots: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // --- 1. Image Loading ---
    let image = image::open(&args.input).with_context(|| format!("failed to open {}", args.input.display()))?;
    let matrix = intensity_matrix(&image)?;
    let (height, width) = matrix.dim();

    // --- 2. Region Selection ---
    let region = Region::new(
        args.x_start,
        args.x_end.unwrap_or(width),
        args.y_start,
        args.y_end.unwrap_or(height),
    );
    let view = region.crop(matrix.view())?;
    info!(
        "analyzing {}x{} region of {}x{} image",
        region.width(),
        region.height(),
        width,
        height
    );

    // --- 3. Pipeline Initialization ---
    let config = PipelineConfig {
        min_area: args.min_area,
        max_area: args.max_area,
        group_diameter: args.diameter,
        ..PipelineConfig::default()
    };
    let pipeline = SpotPipeline::new(config)?;
    let mut session = AnalysisSession::default();
    if let Some(threshold) = args.threshold {
        session.threshold = threshold;
    }

    // --- 4. Threshold Search ---
    if args.auto {
        let sweep = ParallelSweep::for_pipeline(&pipeline, view.view());
        let choice = sweep
            .auto_threshold(&mut session, pipeline.config().optimizer_range)
            .await?;
        if choice.is_scored() {
            println!(
                "Best threshold: {} ({} groups, {} candidates)",
                choice.threshold, choice.group_count, choice.evaluated
            );
        } else {
            println!("No thresholds evaluated; keeping {}", session.threshold);
        }
    }

    // --- 5. Detection ---
    let detection = pipeline.detect_in_session(&session, &view);
    println!(
        "Threshold {}: {} spots in {} groups",
        detection.threshold,
        detection.spots.len(),
        detection.group_count()
    );

    if args.spots {
        for spot in &detection.spots {
            let global = region.to_global(*spot);
            println!("  spot at ({}, {})", global.x, global.y);
        }
    }

    println!("{:>6} {:>8} {:>10} {:>10}", "group", "members", "mean_x", "mean_y");
    for summary in detection.summaries() {
        println!(
            "{:>6} {:>8} {:>10.2} {:>10.2}",
            summary.index,
            summary.member_count,
            summary.mean_x + region.x_start as f64,
            summary.mean_y + region.y_start as f64
        );
    }

    // --- 6. Diagnostic Sweep ---
    if args.profile {
        let sweep = ParallelSweep::for_pipeline(&pipeline, view.view());
        let range = pipeline.config().profile_range;
        let outcome = match args.deadline_ms {
            Some(ms) => sweep.sweep_within(range, Duration::from_millis(ms)).await?,
            None => SweepOutcome::Complete(sweep.sweep_group_counts(range).await?),
        };

        println!("{:>9} {:>7}", "threshold", "groups");
        for point in outcome.profile().points() {
            println!("{:>9} {:>7}", point.threshold, point.group_count);
        }
        if let SweepOutcome::DeadlineExceeded { partial } = &outcome {
            println!("Deadline reached after {} of {} thresholds", partial.len(), range.len());
        }
    }

    Ok(())
}
