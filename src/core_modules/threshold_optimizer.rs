// THEORY:
// The `threshold_optimizer` searches for the intensity threshold that produces
// the most spot groups. It sweeps a `ThresholdRange` (50..200 step 5 by
// default), evaluates every candidate exactly, and keeps a running best.
//
// Key architectural principles:
// 1.  **Strict Improvement**: A candidate only replaces the best when its group
//     count is strictly greater, so ties resolve to the lowest threshold.
// 2.  **Always An Answer**: Degenerate inputs (empty matrix, no spots at any
//     threshold) still produce a `ThresholdChoice`. Only an empty range leaves
//     the choice unscored, which `evaluated == 0` makes visible.
// 3.  **Shared Rule**: `ThresholdChoice::consider` is the single place the
//     selection rule lives; the synchronous and parallel sweeps both fold their
//     ordered points through it.

use crate::core_modules::spot_extractor::AreaFilter;
use crate::core_modules::sweep_profiler::{SweepPoint, evaluate_threshold};
use crate::core_modules::threshold_range::ThresholdRange;
use log::info;
use ndarray::ArrayView2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a threshold search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdChoice {
    /// Lowest threshold reaching the highest group count; 0 when nothing was evaluated.
    pub threshold: i32,
    /// Group count at `threshold`.
    pub group_count: usize,
    /// How many candidate thresholds were evaluated.
    pub evaluated: usize,
}

impl Default for ThresholdChoice {
    fn default() -> Self {
        Self::unscored()
    }
}

impl ThresholdChoice {
    /// The starting state of a search: threshold 0, nothing evaluated.
    pub fn unscored() -> Self {
        Self {
            threshold: 0,
            group_count: 0,
            evaluated: 0,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.evaluated > 0
    }

    /// Folds one evaluated point into the running best. Points must arrive in
    /// ascending threshold order for ties to favour the lowest threshold.
    pub fn consider(&mut self, point: SweepPoint) {
        if !self.is_scored() || point.group_count > self.group_count {
            self.threshold = point.threshold;
            self.group_count = point.group_count;
        }
        self.evaluated += 1;
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = SweepPoint>,
    {
        points.into_iter().fold(Self::unscored(), |mut best, point| {
            best.consider(point);
            best
        })
    }
}

/// Best threshold in `range`, bounding-box area mode.
pub fn find_best_threshold(
    matrix: &ArrayView2<u8>,
    min_area: usize,
    max_area: usize,
    diameter: f64,
    range: ThresholdRange,
) -> ThresholdChoice {
    find_best_threshold_with(matrix, &AreaFilter::new(min_area, max_area), diameter, range)
}

pub fn find_best_threshold_with(
    matrix: &ArrayView2<u8>,
    filter: &AreaFilter,
    diameter: f64,
    range: ThresholdRange,
) -> ThresholdChoice {
    let mut best = ThresholdChoice::unscored();
    for threshold in range.thresholds() {
        best.consider(evaluate_threshold(matrix, filter, diameter, threshold));
    }
    info!(
        "best threshold {} with {} groups after {} candidates",
        best.threshold, best.group_count, best.evaluated
    );
    best
}
