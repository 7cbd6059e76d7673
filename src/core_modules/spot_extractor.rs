// THEORY:
// The `spot_extractor` is the engine of the detection layer. It runs the masker
// and the component labeler over an intensity matrix and keeps every component
// whose size falls inside the configured area range, reporting it as a `Spot`.
//
// Key architectural principles & algorithm steps:
// 1.  **Mask**: Threshold the matrix (`intensity < threshold`).
// 2.  **Label**: Find 4-connected foreground components and their bounding boxes.
// 3.  **Measure**: Compute each component's area. In the default
//     `AreaMode::BoundingBox` the area is the number of foreground pixels inside
//     the component's bounding box, which also counts pixels of any other
//     component whose box overlaps it. `AreaMode::Exact` counts only the
//     component's own pixels.
// 4.  **Filter**: Keep components with `min_area <= area <= max_area`. The
//     range is inclusive at both ends. An inverted range keeps nothing.
// 5.  **Locate**: Each survivor becomes a `Spot` at its bounding-box midpoint.
//     Spots come out in component id order.
// 6.  **Stateless Utility**: Nothing survives between calls. Empty results are
//     ordinary results.

use crate::core_modules::labeling::{Component, label_components};
use crate::core_modules::masker::masker;
use crate::core_modules::spot::Spot;
use ndarray::{ArrayView2, s};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a component's area is measured for the size filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AreaMode {
    /// Foreground pixels inside the component's bounding box, whatever
    /// component they belong to.
    #[default]
    BoundingBox,
    /// Pixels carrying the component's own label.
    Exact,
}

/// Inclusive pixel-count window a component must fall into to become a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaFilter {
    pub min_area: usize,
    pub max_area: usize,
    pub mode: AreaMode,
}

impl AreaFilter {
    pub fn new(min_area: usize, max_area: usize) -> Self {
        Self {
            min_area,
            max_area,
            mode: AreaMode::BoundingBox,
        }
    }

    pub fn with_mode(mut self, mode: AreaMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn accepts(&self, area: usize) -> bool {
        self.min_area <= area && area <= self.max_area
    }
}

pub mod spot_extractor {
    use super::*;

    /// Detects spots in `matrix` at `threshold`, keeping components whose
    /// bounding-box area lies in `[min_area, max_area]`.
    pub fn extract_spots(
        matrix: &ArrayView2<u8>,
        min_area: usize,
        max_area: usize,
        threshold: i32,
    ) -> Vec<Spot> {
        extract_spots_with(matrix, &AreaFilter::new(min_area, max_area), threshold)
    }

    /// Same as [`extract_spots`] with an explicit area filter and mode.
    pub fn extract_spots_with(matrix: &ArrayView2<u8>, filter: &AreaFilter, threshold: i32) -> Vec<Spot> {
        let mask = masker::mask(matrix, threshold);
        let labeled = label_components(&mask.view());

        labeled
            .components
            .iter()
            .filter(|component| filter.accepts(component_area(&mask.view(), component, filter.mode)))
            .map(|component| Spot::from_bounding_box(&component.bounding_box))
            .collect()
    }

    fn component_area(mask: &ArrayView2<bool>, component: &Component, mode: AreaMode) -> usize {
        match mode {
            AreaMode::Exact => component.pixel_count,
            AreaMode::BoundingBox => {
                let bbox = &component.bounding_box;
                let window = mask.slice(s![bbox.y_min..=bbox.y_max, bbox.x_min..=bbox.x_max]);
                masker::foreground_count(&window)
            }
        }
    }
}
