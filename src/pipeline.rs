// THEORY:
// The `pipeline` module is the top-level API for the spot engine. It bundles
// the detection parameters into a `PipelineConfig` and exposes the three things
// a caller does with a region: detect spots and groups at a threshold, search
// for the best threshold, and profile group count across thresholds.
//
// Key architectural principles:
// 1.  **Validated Once**: `SpotPipeline::new` checks the configuration (finite
//     diameter, sweep ranges built through `ThresholdRange::new`). After that
//     no call can fail; empty results are ordinary results.
// 2.  **No Hidden State**: The pipeline holds only its configuration. Every call
//     recomputes from the matrix it is given. The one piece of state that spans
//     calls, the last automatically chosen threshold, lives in an
//     `AnalysisSession` that the caller owns and passes in.
// 3.  **Local Coordinates**: The pipeline works on whatever view it receives.
//     Cropping and mapping back to the full image are done with `Region`.

use crate::core_modules::proximity_clusterer::cluster_spots;
use crate::core_modules::spot::{GroupSummary, Spot, SpotGroup, summarize_groups};
use crate::core_modules::spot_extractor::{AreaFilter, AreaMode, spot_extractor};
use crate::core_modules::sweep_profiler::{SweepProfile, sweep_group_counts_with};
use crate::core_modules::threshold_optimizer::{ThresholdChoice, find_best_threshold_with};
use crate::core_modules::threshold_range::ThresholdRange;
use crate::error::{Result, SpotError};
use log::info;
use ndarray::ArrayView2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_AREA: usize = 30;
pub const DEFAULT_MAX_AREA: usize = 250;
pub const DEFAULT_GROUP_DIAMETER: f64 = 60.0;
/// Threshold a fresh session starts from before any automatic search.
pub const DEFAULT_SESSION_THRESHOLD: i32 = 25;

/// Configuration for the SpotPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Smallest component area (in pixels) that still counts as a spot.
    pub min_area: usize,
    /// Largest component area (in pixels) that still counts as a spot.
    pub max_area: usize,
    /// Spots within half of this distance from a group's anchor join the group.
    pub group_diameter: f64,
    /// How component areas are measured for the size filter.
    pub area_mode: AreaMode,
    /// Candidates for the automatic threshold search.
    pub optimizer_range: ThresholdRange,
    /// Candidates for the diagnostic group-count profile.
    pub profile_range: ThresholdRange,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_AREA,
            max_area: DEFAULT_MAX_AREA,
            group_diameter: DEFAULT_GROUP_DIAMETER,
            area_mode: AreaMode::BoundingBox,
            optimizer_range: ThresholdRange::optimizer_default(),
            profile_range: ThresholdRange::profile_default(),
        }
    }
}

/// A group diameter must be a finite number; zero and negative values are
/// allowed and leave every spot in its own group.
pub fn validate_diameter(diameter: f64) -> Result<()> {
    if !diameter.is_finite() {
        return Err(SpotError::InvalidDiameter(diameter));
    }
    Ok(())
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_diameter(self.group_diameter)
    }

    pub fn area_filter(&self) -> AreaFilter {
        AreaFilter::new(self.min_area, self.max_area).with_mode(self.area_mode)
    }
}

/// Spots and groups found in one region at one threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Detection {
    pub threshold: i32,
    pub spots: Vec<Spot>,
    pub groups: Vec<SpotGroup>,
}

impl Detection {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn summaries(&self) -> Vec<GroupSummary> {
        summarize_groups(&self.groups)
    }
}

/// Caller-owned state that spans calls: the threshold the next render starts
/// from, and the last automatic choice that set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisSession {
    pub threshold: i32,
    pub last_choice: Option<ThresholdChoice>,
}

impl AnalysisSession {
    /// Records an automatic choice. The threshold only moves when at least one
    /// candidate was evaluated.
    pub fn apply_choice(&mut self, choice: ThresholdChoice) {
        if choice.is_scored() {
            info!("session threshold {} -> {}", self.threshold, choice.threshold);
            self.threshold = choice.threshold;
        }
        self.last_choice = Some(choice);
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SESSION_THRESHOLD,
            last_choice: None,
        }
    }
}

/// The main, top-level struct for the spot engine.
#[derive(Debug, Clone)]
pub struct SpotPipeline {
    config: PipelineConfig,
}

impl SpotPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn detect(&self, matrix: &ArrayView2<u8>, threshold: i32) -> Detection {
        let spots = spot_extractor::extract_spots_with(matrix, &self.config.area_filter(), threshold);
        let groups = cluster_spots(&spots, self.config.group_diameter);
        Detection {
            threshold,
            spots,
            groups,
        }
    }

    /// Detects at whatever threshold the session currently holds.
    pub fn detect_in_session(&self, session: &AnalysisSession, matrix: &ArrayView2<u8>) -> Detection {
        self.detect(matrix, session.threshold)
    }

    pub fn find_best_threshold(&self, matrix: &ArrayView2<u8>) -> ThresholdChoice {
        find_best_threshold_with(
            matrix,
            &self.config.area_filter(),
            self.config.group_diameter,
            self.config.optimizer_range,
        )
    }

    pub fn sweep_group_counts(&self, matrix: &ArrayView2<u8>) -> SweepProfile {
        sweep_group_counts_with(
            matrix,
            &self.config.area_filter(),
            self.config.group_diameter,
            self.config.profile_range,
        )
    }

    /// Runs the threshold search and records the result in `session`.
    pub fn auto_threshold(&self, session: &mut AnalysisSession, matrix: &ArrayView2<u8>) -> ThresholdChoice {
        let choice = self.find_best_threshold(matrix);
        session.apply_choice(choice);
        choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::sweep_profiler::SweepPoint;
    use ndarray::{Array2, s};

    fn config(min_area: usize, max_area: usize, group_diameter: f64) -> PipelineConfig {
        PipelineConfig {
            min_area,
            max_area,
            group_diameter,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn defaults_match_the_interactive_tool() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_area, 30);
        assert_eq!(config.max_area, 250);
        assert_eq!(config.group_diameter, 60.0);
        assert_eq!(config.area_mode, AreaMode::BoundingBox);
        assert_eq!(AnalysisSession::default().threshold, 25);
    }

    #[test]
    fn non_finite_diameter_is_rejected() {
        assert!(matches!(
            SpotPipeline::new(config(1, 10, f64::NAN)),
            Err(SpotError::InvalidDiameter(_))
        ));
        assert!(SpotPipeline::new(config(1, 10, f64::INFINITY)).is_err());
        assert!(SpotPipeline::new(config(1, 10, -4.0)).is_ok());
    }

    #[test]
    fn unscored_choice_is_recorded_without_moving_the_threshold() {
        let mut session = AnalysisSession::default();
        session.apply_choice(ThresholdChoice::unscored());
        assert_eq!(session.threshold, DEFAULT_SESSION_THRESHOLD);
        assert_eq!(session.last_choice, Some(ThresholdChoice::unscored()));

        let scored = ThresholdChoice::from_points([SweepPoint { threshold: 85, group_count: 2 }]);
        session.apply_choice(scored);
        assert_eq!(session.threshold, 85);
    }

    #[test]
    fn detect_groups_close_blocks() {
        let mut matrix = Array2::from_elem((12, 12), 220u8);
        matrix.slice_mut(s![1..3, 1..3]).fill(5);
        matrix.slice_mut(s![1..3, 5..7]).fill(5);
        matrix.slice_mut(s![9..11, 9..11]).fill(5);

        let pipeline = SpotPipeline::new(config(1, 10, 10.0)).expect("valid config");
        let detection = pipeline.detect(&matrix.view(), 100);

        assert_eq!(detection.spots, vec![Spot::new(2, 2), Spot::new(6, 2), Spot::new(10, 10)]);
        assert_eq!(detection.group_count(), 2);
        let rows = detection.summaries();
        assert_eq!(rows[0].member_count, 2);
        assert_eq!((rows[0].mean_x, rows[0].mean_y), (4.0, 2.0));
        assert_eq!(rows[1].member_count, 1);
    }

    #[test]
    fn auto_threshold_updates_the_session() {
        let mut matrix = Array2::from_elem((10, 10), 200u8);
        matrix[[2, 2]] = 70;
        matrix[[7, 7]] = 70;

        let pipeline = SpotPipeline::new(config(1, 4, 2.0)).expect("valid config");
        let mut session = AnalysisSession::default();

        let choice = pipeline.auto_threshold(&mut session, &matrix.view());

        assert_eq!(choice.threshold, 75);
        assert_eq!(choice.group_count, 2);
        assert_eq!(session.threshold, 75);
        assert_eq!(session.last_choice, Some(choice));
        assert_eq!(pipeline.detect_in_session(&session, &matrix.view()).group_count(), 2);
    }

    #[test]
    fn empty_search_range_leaves_session_threshold_alone() {
        let matrix = Array2::from_elem((4, 4), 0u8);
        let pipeline = SpotPipeline::new(PipelineConfig {
            optimizer_range: ThresholdRange::new(90, 90, 5).expect("valid range"),
            ..config(1, 4, 2.0)
        })
        .expect("valid config");
        let mut session = AnalysisSession { threshold: 42, last_choice: None };

        let choice = pipeline.auto_threshold(&mut session, &matrix.view());

        assert!(!choice.is_scored());
        assert_eq!(session.threshold, 42);
        assert_eq!(session.last_choice, Some(choice));
    }

    #[test]
    fn profile_uses_the_configured_range() {
        let matrix = Array2::from_elem((5, 5), 255u8);
        let pipeline = SpotPipeline::new(PipelineConfig::default()).expect("valid config");
        let profile = pipeline.sweep_group_counts(&matrix.view());
        assert_eq!(profile.len(), 34);
        assert_eq!(profile.thresholds()[0], 30);
    }
}
