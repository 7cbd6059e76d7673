// THEORY:
// The `masker` is the first stage of the detection stack. It turns a grayscale
// intensity matrix into a binary foreground mask: a pixel is foreground when it
// is darker than the threshold. Everything downstream (labeling, spot
// extraction, grouping) only ever sees this mask, never the raw intensities.
//
// Key architectural principles:
// 1.  **Dark Is Foreground**: The features we look for are dark spots on a light
//     background, so the comparison is strictly `intensity < threshold`.
// 2.  **Saturating Thresholds**: The threshold is a plain `i32`. Anything at or
//     below 0 produces an empty mask and anything at or above 256 produces a full
//     one, because every `u8` intensity compares consistently against it.
// 3.  **Stateless Utility**: A pure function of its inputs. The mask is derived
//     fresh for every call and is never mutated afterwards.

pub mod masker {
    use ndarray::{Array2, ArrayView2};

    /// Builds the foreground mask for `matrix`: `true` where the intensity is
    /// strictly below `threshold`.
    pub fn mask(matrix: &ArrayView2<u8>, threshold: i32) -> Array2<bool> {
        matrix.mapv(|intensity| i32::from(intensity) < threshold)
    }

    /// Number of foreground pixels in a mask.
    pub fn foreground_count(mask: &ArrayView2<bool>) -> usize {
        mask.iter().filter(|&&is_foreground| is_foreground).count()
    }
}
