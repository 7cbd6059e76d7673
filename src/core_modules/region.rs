use crate::core_modules::spot::Spot;
use crate::error::{Result, SpotError};
use ndarray::{ArrayView2, s};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rectangular, half-open window `[x_start, x_end) x [y_start, y_end)` of a
/// full image. Analysis runs on the cropped view; spots found there are local
/// to the window until mapped back with [`Region::to_global`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub x_start: usize,
    pub x_end: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl Region {
    pub fn new(x_start: usize, x_end: usize, y_start: usize, y_end: usize) -> Self {
        Self {
            x_start,
            x_end,
            y_start,
            y_end,
        }
    }

    /// The whole of a `width` x `height` image.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, width, 0, height)
    }

    pub fn width(&self) -> usize {
        self.x_end.saturating_sub(self.x_start)
    }

    pub fn height(&self) -> usize {
        self.y_end.saturating_sub(self.y_start)
    }

    /// Borrows the window out of `matrix` (rows are y, columns are x).
    pub fn crop<'a>(&self, matrix: ArrayView2<'a, u8>) -> Result<ArrayView2<'a, u8>> {
        if self.x_start > self.x_end || self.y_start > self.y_end {
            return Err(SpotError::InvertedRegion {
                x_start: self.x_start,
                x_end: self.x_end,
                y_start: self.y_start,
                y_end: self.y_end,
            });
        }

        let (height, width) = matrix.dim();
        if self.x_end > width || self.y_end > height {
            return Err(SpotError::RegionOutOfBounds {
                x_start: self.x_start,
                x_end: self.x_end,
                y_start: self.y_start,
                y_end: self.y_end,
                width,
                height,
            });
        }

        Ok(matrix.slice_move(s![self.y_start..self.y_end, self.x_start..self.x_end]))
    }

    /// Maps a spot found inside the window into full-image coordinates.
    pub fn to_global(&self, spot: Spot) -> Spot {
        Spot::new(spot.x + self.x_start, spot.y + self.y_start)
    }
}
