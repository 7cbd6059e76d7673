use thiserror::Error;

/// Input-contract violations at the public API boundary.
///
/// "Nothing found" is never an error: empty spot and group lists are ordinary
/// results and are returned as such.
#[derive(Debug, Error)]
pub enum SpotError {
    /// The group diameter must be a finite number.
    #[error("group diameter must be finite, got {0}")]
    InvalidDiameter(f64),

    /// A threshold sweep needs a strictly positive step.
    #[error("threshold sweep step must be positive, got {0}")]
    InvalidStep(i32),

    /// The requested region does not fit inside the source matrix.
    #[error("region x {x_start}..{x_end}, y {y_start}..{y_end} exceeds matrix of {width}x{height}")]
    RegionOutOfBounds {
        x_start: usize,
        x_end: usize,
        y_start: usize,
        y_end: usize,
        width: usize,
        height: usize,
    },

    /// A region whose end lies before its start on either axis.
    #[error("region x {x_start}..{x_end}, y {y_start}..{y_end} is inverted")]
    InvertedRegion {
        x_start: usize,
        x_end: usize,
        y_start: usize,
        y_end: usize,
    },

    /// A spot group must hold at least its anchor.
    #[error("spot group has no members")]
    EmptyGroup,

    /// A pixel buffer did not match the image dimensions.
    #[error("pixel buffer does not fit image shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// A parallel sweep worker panicked or was cancelled.
    #[error("sweep task for threshold {threshold} failed: {source}")]
    SweepTask {
        threshold: i32,
        #[source]
        source: tokio::task::JoinError,
    },
}

pub type Result<T> = std::result::Result<T, SpotError>;
