use crate::error::{Result, SpotError};
use std::iter::StepBy;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open sweep `[low, high)` over candidate thresholds in steps of `step`.
///
/// The step is always positive. A range with `low >= high` is valid and simply
/// has no candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawThresholdRange"))]
pub struct ThresholdRange {
    low: i32,
    high: i32,
    step: i32,
}

impl ThresholdRange {
    pub const OPTIMIZER_LOW: i32 = 50;
    pub const PROFILE_LOW: i32 = 30;
    pub const DEFAULT_HIGH: i32 = 200;
    pub const DEFAULT_STEP: i32 = 5;

    pub fn new(low: i32, high: i32, step: i32) -> Result<Self> {
        if step <= 0 {
            return Err(SpotError::InvalidStep(step));
        }
        Ok(Self { low, high, step })
    }

    /// 50, 55, ..., 195.
    pub fn optimizer_default() -> Self {
        Self {
            low: Self::OPTIMIZER_LOW,
            high: Self::DEFAULT_HIGH,
            step: Self::DEFAULT_STEP,
        }
    }

    /// 30, 35, ..., 195.
    pub fn profile_default() -> Self {
        Self {
            low: Self::PROFILE_LOW,
            high: Self::DEFAULT_HIGH,
            step: Self::DEFAULT_STEP,
        }
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn high(&self) -> i32 {
        self.high
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// Candidate thresholds in ascending order.
    pub fn thresholds(&self) -> StepBy<Range<i32>> {
        (self.low..self.high).step_by(self.step as usize)
    }

    pub fn len(&self) -> usize {
        self.thresholds().len()
    }

    pub fn is_empty(&self) -> bool {
        self.low >= self.high
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawThresholdRange {
    low: i32,
    high: i32,
    step: i32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawThresholdRange> for ThresholdRange {
    type Error = SpotError;

    fn try_from(raw: RawThresholdRange) -> Result<Self> {
        ThresholdRange::new(raw.low, raw.high, raw.step)
    }
}
