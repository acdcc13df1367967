use crate::error::{PreprocessError, Result};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use ndarray::Array3;

// ============================================================================
// Decoded images -> arrays
// ============================================================================

/// Converts a decoded image to a `(height, width, 3)` RGB `u8` array.
///
/// Channel Handling
/// | Input Format  | Output             |
/// |---------------|--------------------|
/// | RGB8          | copied as-is       |
/// | Other         | converted to RGB8  |
pub fn image_to_array(img: &DynamicImage) -> Result<Array3<u8>> {
    let rgb = match img {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        other => other.to_rgb8(),
    };
    let (width, height) = rgb.dimensions();
    Array3::from_shape_vec((height as usize, width as usize, 3), rgb.into_raw())
        .map_err(|e| PreprocessError::InvalidArgument(format!("RGB buffer has wrong length: {e}")))
}

/// Converts an 8-bit label map (one class index per pixel) to a
/// `(height, width, 1)` array.
pub fn label_to_array(label: &GrayImage) -> Result<Array3<u8>> {
    luma_to_array(label)
}

/// Converts a 16-bit label map to a `(height, width, 1)` array, for datasets
/// with more than 256 classes.
pub fn label16_to_array(label: &ImageBuffer<Luma<u16>, Vec<u16>>) -> Result<Array3<u16>> {
    luma_to_array(label)
}

fn luma_to_array<T>(label: &ImageBuffer<Luma<T>, Vec<T>>) -> Result<Array3<T>>
where
    T: image::Primitive,
{
    let (width, height) = label.dimensions();
    Array3::from_shape_vec((height as usize, width as usize, 1), label.as_raw().clone())
        .map_err(|e| PreprocessError::InvalidArgument(format!("label buffer has wrong length: {e}")))
}
