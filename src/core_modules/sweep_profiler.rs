// THEORY:
// The `sweep_profiler` is the diagnostic view of the threshold search. It runs
// the whole extraction and grouping pipeline once for every threshold in a
// range and records how many groups each threshold produced, so a UI can plot
// group count against intensity.
//
// Key architectural principles:
// 1.  **Exact Per-Threshold Work**: Every threshold is recomputed from the raw
//     matrix. Nothing is carried over from one threshold to the next.
// 2.  **No Selection**: Unlike the optimizer, the profiler keeps every point and
//     never picks a winner.
// 3.  **Shared Evaluation**: `evaluate_threshold` is the one place the
//     mask → label → extract → group chain is run for a single threshold. The
//     optimizer and the parallel sweep both go through it.

use crate::core_modules::proximity_clusterer::cluster_spots;
use crate::core_modules::spot_extractor::{AreaFilter, spot_extractor};
use crate::core_modules::threshold_range::ThresholdRange;
use log::debug;
use ndarray::ArrayView2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Group count observed at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepPoint {
    pub threshold: i32,
    pub group_count: usize,
}

/// Every point of a sweep, in ascending threshold order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepProfile {
    points: Vec<SweepPoint>,
}

impl SweepProfile {
    pub fn from_points(points: Vec<SweepPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn thresholds(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.threshold).collect()
    }

    pub fn group_counts(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.group_count).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Runs mask, label, extract and group for one threshold and scores it by
/// the number of groups.
pub fn evaluate_threshold(
    matrix: &ArrayView2<u8>,
    filter: &AreaFilter,
    diameter: f64,
    threshold: i32,
) -> SweepPoint {
    let spots = spot_extractor::extract_spots_with(matrix, filter, threshold);
    let groups = cluster_spots(&spots, diameter);
    debug!(
        "threshold {threshold}: {} spots in {} groups",
        spots.len(),
        groups.len()
    );
    SweepPoint {
        threshold,
        group_count: groups.len(),
    }
}

/// Group count for every threshold in `range`, bounding-box area mode.
pub fn sweep_group_counts(
    matrix: &ArrayView2<u8>,
    min_area: usize,
    max_area: usize,
    diameter: f64,
    range: ThresholdRange,
) -> SweepProfile {
    sweep_group_counts_with(matrix, &AreaFilter::new(min_area, max_area), diameter, range)
}

pub fn sweep_group_counts_with(
    matrix: &ArrayView2<u8>,
    filter: &AreaFilter,
    diameter: f64,
    range: ThresholdRange,
) -> SweepProfile {
    let points = range
        .thresholds()
        .map(|threshold| evaluate_threshold(matrix, filter, diameter, threshold))
        .collect();
    SweepProfile::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, s};

    #[test]
    fn default_profile_covers_thirty_to_one_ninety_five() {
        let matrix = Array2::from_elem((8, 8), 255u8);
        let profile = sweep_group_counts(&matrix.view(), 1, 100, 4.0, ThresholdRange::profile_default());

        assert_eq!(profile.len(), 34);
        assert_eq!(profile.thresholds(), (0..34).map(|i| 30 + 5 * i).collect::<Vec<i32>>());
        assert_eq!(profile.group_counts(), vec![0; 34]);
    }

    #[test]
    fn counts_change_with_intensity() {
        // Three isolated dots that turn dark at different thresholds.
        let mut matrix = Array2::from_elem((5, 9), 250u8);
        matrix[[2, 1]] = 40;
        matrix[[2, 4]] = 90;
        matrix[[2, 7]] = 140;

        let range = ThresholdRange::new(30, 160, 50).expect("valid range");
        let profile = sweep_group_counts(&matrix.view(), 1, 1, 2.0, range);

        assert_eq!(profile.thresholds(), vec![30, 80, 130]);
        assert_eq!(profile.group_counts(), vec![0, 1, 2]);
    }

    #[test]
    fn empty_range_gives_empty_profile() {
        let matrix = Array2::from_elem((4, 4), 0u8);
        let range = ThresholdRange::new(100, 100, 5).expect("valid range");
        assert!(sweep_group_counts(&matrix.view(), 1, 10, 2.0, range).is_empty());
    }

    #[test]
    fn evaluate_threshold_scores_by_groups() {
        let mut matrix = Array2::from_elem((10, 10), 200u8);
        matrix.slice_mut(s![0..3, 0..3]).fill(10);
        matrix.slice_mut(s![7..10, 7..10]).fill(10);

        let tight = evaluate_threshold(&matrix.view(), &AreaFilter::new(1, 20), 2.0, 50);
        let loose = evaluate_threshold(&matrix.view(), &AreaFilter::new(1, 20), 30.0, 50);
        assert_eq!(tight, SweepPoint { threshold: 50, group_count: 2 });
        assert_eq!(loose.group_count, 1);
    }
}
