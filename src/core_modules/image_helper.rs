pub mod image_helper {
    use crate::error::Result;
    use image::{DynamicImage, GrayImage};
    use ndarray::Array2;

    /// Copies a luma buffer into an intensity matrix (rows = height, cols = width).
    /// The buffer is already row-major, so this is a single copy.
    pub fn luma_matrix(image: &GrayImage) -> Result<Array2<u8>> {
        let (width, height) = image.dimensions();
        let matrix = Array2::from_shape_vec((height as usize, width as usize), image.as_raw().clone())?;
        Ok(matrix)
    }

    /// Converts any decoded image to luma first.
    pub fn intensity_matrix(image: &DynamicImage) -> Result<Array2<u8>> {
        luma_matrix(&image.to_luma8())
    }
}
