// THEORY:
// The `parallel_sweep` module runs threshold sweeps on a tokio runtime. Every
// threshold is an independent, CPU-bound job, so each one is handed to the
// blocking pool and the results are reassembled in threshold order.
//
// Key architectural principles:
// 1.  **Same Answer, Faster**: Each job calls the same `evaluate_threshold` as
//     the synchronous sweep, and results come back in ascending threshold
//     order, so profiles and threshold choices are identical to the
//     synchronous ones.
// 2.  **Bounded Workers**: A semaphore sized to the CPU count (overridable)
//     caps how many thresholds are evaluated at once.
// 3.  **Deadline As An Outcome**: A sweep given a deadline reports
//     `SweepOutcome::DeadlineExceeded` with the completed prefix instead of
//     failing. Jobs already on the blocking pool finish in the background and
//     their results are dropped.
// 4.  **Owned Input**: The matrix is copied once into an `Arc` so jobs can
//     outlive the caller's borrow.

use crate::core_modules::spot_extractor::AreaFilter;
use crate::core_modules::sweep_profiler::{SweepPoint, SweepProfile, evaluate_threshold};
use crate::core_modules::threshold_optimizer::ThresholdChoice;
use crate::core_modules::threshold_range::ThresholdRange;
use crate::error::{Result, SpotError};
use crate::pipeline::{AnalysisSession, SpotPipeline, validate_diameter};
use futures::stream::{FuturesOrdered, StreamExt};
use log::{info, warn};
use ndarray::{Array2, ArrayView2};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Result of a sweep that may be cut short by a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Every threshold in the range was evaluated.
    Complete(SweepProfile),
    /// The deadline passed first; `partial` holds the leading thresholds that
    /// finished in time, still in ascending order.
    DeadlineExceeded { partial: SweepProfile },
}

impl SweepOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, SweepOutcome::Complete(_))
    }

    pub fn profile(&self) -> &SweepProfile {
        match self {
            SweepOutcome::Complete(profile) => profile,
            SweepOutcome::DeadlineExceeded { partial } => partial,
        }
    }
}

pub struct ParallelSweep {
    matrix: Arc<Array2<u8>>,
    filter: AreaFilter,
    diameter: f64,
    workers: usize,
}

impl ParallelSweep {
    /// Fails with `InvalidDiameter` for a NaN or infinite diameter, like
    /// `SpotPipeline::new`.
    pub fn new(matrix: ArrayView2<u8>, filter: AreaFilter, diameter: f64) -> Result<Self> {
        validate_diameter(diameter)?;
        Ok(Self::unchecked(matrix, filter, diameter))
    }

    /// Uses the area filter and diameter of an existing, already validated
    /// pipeline.
    pub fn for_pipeline(pipeline: &SpotPipeline, matrix: ArrayView2<u8>) -> Self {
        let config = pipeline.config();
        Self::unchecked(matrix, config.area_filter(), config.group_diameter)
    }

    fn unchecked(matrix: ArrayView2<u8>, filter: AreaFilter, diameter: f64) -> Self {
        Self {
            matrix: Arc::new(matrix.to_owned()),
            filter,
            diameter,
            workers: num_cpus::get().max(1),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Group count for every threshold in `range`.
    pub async fn sweep_group_counts(&self, range: ThresholdRange) -> Result<SweepProfile> {
        let (points, _) = self.run(range, None).await?;
        Ok(SweepProfile::from_points(points))
    }

    /// Like [`Self::sweep_group_counts`] but gives up at `deadline`.
    pub async fn sweep_until(&self, range: ThresholdRange, deadline: Instant) -> Result<SweepOutcome> {
        let (points, complete) = self.run(range, Some(deadline)).await?;
        let profile = SweepProfile::from_points(points);
        Ok(if complete {
            SweepOutcome::Complete(profile)
        } else {
            SweepOutcome::DeadlineExceeded { partial: profile }
        })
    }

    pub async fn sweep_within(&self, range: ThresholdRange, budget: Duration) -> Result<SweepOutcome> {
        self.sweep_until(range, Instant::now() + budget).await
    }

    /// Best threshold in `range`, same tie-breaking as the synchronous search.
    pub async fn find_best_threshold(&self, range: ThresholdRange) -> Result<ThresholdChoice> {
        let (points, _) = self.run(range, None).await?;
        let best = ThresholdChoice::from_points(points);
        info!(
            "best threshold {} with {} groups after {} candidates ({} workers)",
            best.threshold, best.group_count, best.evaluated, self.workers
        );
        Ok(best)
    }

    /// Searches `range` and records the result in `session`, with the same
    /// session rule as `SpotPipeline::auto_threshold`.
    pub async fn auto_threshold(&self, session: &mut AnalysisSession, range: ThresholdRange) -> Result<ThresholdChoice> {
        let choice = self.find_best_threshold(range).await?;
        session.apply_choice(choice);
        Ok(choice)
    }

    async fn run(&self, range: ThresholdRange, deadline: Option<Instant>) -> Result<(Vec<SweepPoint>, bool)> {
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut pending = FuturesOrdered::new();

        for threshold in range.thresholds() {
            let matrix = Arc::clone(&self.matrix);
            let permits = Arc::clone(&permits);
            let filter = self.filter;
            let diameter = self.diameter;

            pending.push_back(async move {
                // The semaphore is never closed, so acquiring only waits.
                let permit = permits.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    evaluate_threshold(&matrix.view(), &filter, diameter, threshold)
                })
                .await
                .map_err(|source| SpotError::SweepTask { threshold, source })
            });
        }

        let mut points = Vec::with_capacity(range.len());
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, pending.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(
                            "sweep deadline passed after {} of {} thresholds",
                            points.len(),
                            range.len()
                        );
                        return Ok((points, false));
                    }
                },
                None => pending.next().await,
            };

            match next {
                Some(point) => points.push(point?),
                None => return Ok((points, true)),
            }
        }
    }
}
