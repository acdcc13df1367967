use crate::error::{PreprocessError, Result};
use crate::rng::{worker_gen_range, worker_id};
use crate::transforms::vision::validate::{as_rank3, validate_matching, validate_shapes};
use ndarray::{s, Array3, ArrayView, ArrayView3, Dimension};

// ============================================================================
// CropGeometry
// ============================================================================

/// A rectangular region of a (height, width, channels) array.
///
/// The same geometry is handed to every image and label of one call, which
/// is what keeps pixel (i, j) of an image aligned with pixel (i, j) of its
/// label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropGeometry {
    pub offset_height: usize,
    pub offset_width: usize,
    pub crop_height: usize,
    pub crop_width: usize,
}

impl CropGeometry {
    pub fn new(offset_height: usize, offset_width: usize, crop_height: usize, crop_width: usize) -> Self {
        Self {
            offset_height,
            offset_width,
            crop_height,
            crop_width,
        }
    }

    /// Fails with [`PreprocessError::CropSize`] unless the region lies inside
    /// a `height` x `width` source.
    pub fn check_fits(&self, height: usize, width: usize) -> Result<()> {
        let fits_height = self
            .offset_height
            .checked_add(self.crop_height)
            .is_some_and(|end| self.crop_height <= height && end <= height);
        let fits_width = self
            .offset_width
            .checked_add(self.crop_width)
            .is_some_and(|end| self.crop_width <= width && end <= width);
        if fits_height && fits_width {
            Ok(())
        } else {
            Err(self.size_error(height, width))
        }
    }

    fn size_error(&self, height: usize, width: usize) -> PreprocessError {
        PreprocessError::CropSize {
            height,
            width,
            offset_height: self.offset_height,
            offset_width: self.offset_width,
            crop_height: self.crop_height,
            crop_width: self.crop_width,
        }
    }
}

// ============================================================================
// Crop
// ============================================================================

/// Copies `geometry` out of `array` into a new `(crop_height, crop_width, C)`
/// array.
///
/// Rank and bounds are checked against the runtime shape before slicing, so
/// an oversized crop returns an error instead of a partial slice.
pub fn crop<A, D>(array: ArrayView<'_, A, D>, geometry: CropGeometry) -> Result<Array3<A>>
where
    A: Clone,
    D: Dimension,
{
    let view = as_rank3(array, "crop input")?;
    let (height, width, _) = view.dim();
    geometry.check_fits(height, width)?;

    let CropGeometry {
        offset_height: oh,
        offset_width: ow,
        crop_height: ch,
        crop_width: cw,
    } = geometry;
    Ok(view.slice(s![oh..oh + ch, ow..ow + cw, ..]).to_owned())
}

// ============================================================================
// RandomCrop
// ============================================================================

/// Crops every image and every label with one randomly placed
/// `crop_height` x `crop_width` window.
///
/// The images must all share height and width; labels are checked against
/// the same size. Offsets are drawn once per call from the worker RNG,
/// uniformly in `[0, height - crop_height]` and `[0, width - crop_width]`.
pub fn random_crop<A, L, D, E>(
    images: &[ArrayView<'_, A, D>],
    labels: &[ArrayView<'_, L, E>],
    crop_height: usize,
    crop_width: usize,
) -> Result<(Vec<Array3<A>>, Vec<Array3<L>>)>
where
    A: Clone,
    L: Clone,
    D: Dimension,
    E: Dimension,
{
    let (height, width) = validate_shapes(images, "image")?;
    validate_matching(labels, "label", height, width, 0)?;

    let bounds = CropGeometry::new(0, 0, crop_height, crop_width);
    bounds.check_fits(height, width)?;

    let geometry = CropGeometry {
        offset_height: worker_gen_range(0..=height - crop_height),
        offset_width: worker_gen_range(0..=width - crop_width),
        ..bounds
    };
    tracing::debug!(
        worker_id = worker_id(),
        offset_height = geometry.offset_height,
        offset_width = geometry.offset_width,
        crop_height,
        crop_width,
        "random crop"
    );

    apply_geometry(images, labels, geometry)
}

fn apply_geometry<A, L, D, E>(
    images: &[ArrayView<'_, A, D>],
    labels: &[ArrayView<'_, L, E>],
    geometry: CropGeometry,
) -> Result<(Vec<Array3<A>>, Vec<Array3<L>>)>
where
    A: Clone,
    L: Clone,
    D: Dimension,
    E: Dimension,
{
    let cropped_images = images
        .iter()
        .map(|image| crop(image.view(), geometry))
        .collect::<Result<Vec<_>>>()?;
    let cropped_labels = labels
        .iter()
        .map(|label| crop(label.view(), geometry))
        .collect::<Result<Vec<_>>>()?;
    Ok((cropped_images, cropped_labels))
}

// ============================================================================
// CenterCrop
// ============================================================================

/// Centred crop geometry for a `height` x `width` source.
///
/// Offsets use floor division, so an odd leftover puts the extra row or
/// column at the bottom/right.
pub fn center_geometry(height: usize, width: usize, crop_height: usize, crop_width: usize) -> Result<CropGeometry> {
    let bounds = CropGeometry::new(0, 0, crop_height, crop_width);
    bounds.check_fits(height, width)?;
    Ok(CropGeometry {
        offset_height: (height - crop_height) / 2,
        offset_width: (width - crop_width) / 2,
        ..bounds
    })
}

/// Centre-crops each `(image, label)` pair with geometry derived from that
/// pair's image. Pairs may differ in size from one another, but each label
/// must match its own image's height and width.
pub fn center_crop<A, L, D, E>(
    images: &[ArrayView<'_, A, D>],
    labels: &[ArrayView<'_, L, E>],
    crop_height: usize,
    crop_width: usize,
) -> Result<(Vec<Array3<A>>, Vec<Array3<L>>)>
where
    A: Clone,
    L: Clone,
    D: Dimension,
    E: Dimension,
{
    if images.len() != labels.len() {
        return Err(PreprocessError::InvalidArgument(format!(
            "center crop needs one label per image (got {} images, {} labels)",
            images.len(),
            labels.len()
        )));
    }

    let mut output_images = Vec::with_capacity(images.len());
    let mut output_labels = Vec::with_capacity(labels.len());
    for (i, (image, label)) in images.iter().zip(labels).enumerate() {
        let image = as_rank3(image.view(), &format!("image[{i}]"))?;
        let (height, width, _) = image.dim();
        validate_matching(&[label.view()], "label", height, width, i)?;
        let geometry = center_geometry(height, width, crop_height, crop_width)?;

        output_images.push(crop(image, geometry)?);
        output_labels.push(crop(label.view(), geometry)?);
    }
    Ok((output_images, output_labels))
}

// ============================================================================
// AspectPreservingResize
// ============================================================================

/// Output size whose shorter side is `smallest_side`, keeping the aspect
/// ratio.
///
/// The scale comes from the width when `height > width` and from the height
/// otherwise (including square inputs). Sizes are truncated toward zero.
/// Arithmetic is done in `f32`.
pub fn smallest_size_at_least(height: usize, width: usize, smallest_side: usize) -> (usize, usize) {
    let h = height as f32;
    let w = width as f32;
    let side = smallest_side as f32;

    let scale = if h > w { side / w } else { side / h };
    ((h * scale) as usize, (w * scale) as usize)
}

fn check_resizable(height: usize, width: usize, new_height: usize, new_width: usize) -> Result<()> {
    if height == 0 || width == 0 || new_height == 0 || new_width == 0 {
        return Err(PreprocessError::InvalidArgument(format!(
            "cannot resize {height}x{width} to {new_height}x{new_width}: sizes must be positive"
        )));
    }
    Ok(())
}

/// Source coordinate, neighbour and blend weight for each output index.
/// `in_size` must be non-zero.
fn bilinear_taps(in_size: usize, out_size: usize) -> Vec<(usize, usize, f32)> {
    let scale = in_size as f32 / out_size as f32;
    let last = in_size - 1;
    (0..out_size)
        .map(|i| {
            let src = i as f32 * scale;
            let lower = (src.floor() as usize).min(last);
            let upper = (lower + 1).min(last);
            (lower, upper, src - lower as f32)
        })
        .collect()
}

fn nearest_taps(in_size: usize, out_size: usize) -> Vec<usize> {
    let scale = in_size as f32 / out_size as f32;
    (0..out_size)
        .map(|i| ((i as f32 * scale).floor() as usize).min(in_size - 1))
        .collect()
}

/// Bilinear resize of a non-empty (H, W, C) array to `(new_height,
/// new_width, C)`, producing `f32` values.
///
/// Sampling follows the corner-aligned-off convention: output index `i` reads
/// source coordinate `i * in / out`. Empty source or target sizes fail with
/// [`PreprocessError::InvalidArgument`].
pub fn resize_bilinear<A>(image: ArrayView3<'_, A>, new_height: usize, new_width: usize) -> Result<Array3<f32>>
where
    A: Copy + Into<f32>,
{
    let (height, width, channels) = image.dim();
    check_resizable(height, width, new_height, new_width)?;
    let ys = bilinear_taps(height, new_height);
    let xs = bilinear_taps(width, new_width);

    Ok(Array3::from_shape_fn((new_height, new_width, channels), |(y, x, c)| {
        let (y0, y1, dy) = ys[y];
        let (x0, x1, dx) = xs[x];
        let top_left: f32 = image[[y0, x0, c]].into();
        let top_right: f32 = image[[y0, x1, c]].into();
        let bottom_left: f32 = image[[y1, x0, c]].into();
        let bottom_right: f32 = image[[y1, x1, c]].into();

        let top = top_left + (top_right - top_left) * dx;
        let bottom = bottom_left + (bottom_right - bottom_left) * dx;
        top + (bottom - top) * dy
    }))
}

/// Nearest-neighbour resize; values are copied, never blended.
pub fn resize_nearest<L>(label: ArrayView3<'_, L>, new_height: usize, new_width: usize) -> Result<Array3<L>>
where
    L: Clone,
{
    let (height, width, channels) = label.dim();
    check_resizable(height, width, new_height, new_width)?;
    let ys = nearest_taps(height, new_height);
    let xs = nearest_taps(width, new_width);

    Ok(Array3::from_shape_fn((new_height, new_width, channels), |(y, x, c)| {
        label[[ys[y], xs[x], c]].clone()
    }))
}

/// Rescales an image and its label so the shorter side equals
/// `smallest_side`.
///
/// The image is resampled bilinearly; the label uses nearest neighbour so
/// class indices are never mixed.
pub fn aspect_preserving_resize<A, L, D, E>(
    image: ArrayView<'_, A, D>,
    label: ArrayView<'_, L, E>,
    smallest_side: usize,
) -> Result<(Array3<f32>, Array3<L>)>
where
    A: Copy + Into<f32>,
    L: Clone,
    D: Dimension,
    E: Dimension,
{
    let image = as_rank3(image, "image")?;
    let label = as_rank3(label, "label")?;
    let (height, width, _) = image.dim();
    validate_matching(&[label.view()], "label", height, width, 0)?;

    if smallest_side == 0 {
        return Err(PreprocessError::InvalidArgument(
            "smallest_side must be positive".into(),
        ));
    }
    if height == 0 || width == 0 {
        return Err(PreprocessError::InvalidArgument(format!(
            "cannot resize an empty {height}x{width} image"
        )));
    }

    let (new_height, new_width) = smallest_size_at_least(height, width, smallest_side);
    if new_height == 0 || new_width == 0 {
        return Err(PreprocessError::InvalidArgument(format!(
            "resize of {height}x{width} to side {smallest_side} yields an empty image"
        )));
    }
    tracing::trace!(height, width, new_height, new_width, "aspect preserving resize");

    Ok((
        resize_bilinear(image, new_height, new_width)?,
        resize_nearest(label, new_height, new_width)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{clear_worker_rng, init_worker_rng};
    use anyhow::Result;
    use ndarray::{Array2, ArrayD, IxDyn};

    /// Each pixel encodes its own (row, col) so crops can be located.
    fn coordinate_image(height: usize, width: usize, channels: usize) -> Array3<i32> {
        Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
            (y * 1000 + x * 10 + c) as i32
        })
    }

    #[test]
    fn test_crop_copies_region() -> Result<()> {
        let img = coordinate_image(6, 8, 3);
        let out = crop(img.view(), CropGeometry::new(1, 2, 3, 4))?;
        assert_eq!(out.dim(), (3, 4, 3));
        assert_eq!(out[[0, 0, 0]], 1020);
        assert_eq!(out[[2, 3, 2]], 3052);
        Ok(())
    }

    #[test]
    fn test_crop_full_size_is_identity() -> Result<()> {
        let img = coordinate_image(5, 7, 1);
        let out = crop(img.view(), CropGeometry::new(0, 0, 5, 7))?;
        assert_eq!(out, img);
        Ok(())
    }

    #[test]
    fn test_crop_too_tall_fails() {
        let img = coordinate_image(4, 4, 3);
        let err = crop(img.view(), CropGeometry::new(0, 0, 5, 2)).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::CropSize {
                height: 4,
                crop_height: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_crop_offset_past_edge_fails() {
        let img = coordinate_image(4, 4, 3);
        let err = crop(img.view(), CropGeometry::new(2, 0, 3, 3)).unwrap_err();
        assert!(matches!(err, PreprocessError::CropSize { .. }));
    }

    #[test]
    fn test_crop_rejects_wrong_rank() {
        let flat = Array2::<u8>::zeros((4, 4));
        let err = crop(flat.view(), CropGeometry::new(0, 0, 2, 2)).unwrap_err();
        assert!(matches!(err, PreprocessError::Rank { actual: 2, .. }));
    }

    #[test]
    fn test_crop_accepts_dynamic_rank() -> Result<()> {
        let dynamic = ArrayD::<f32>::ones(IxDyn(&[4, 4, 3]));
        let out = crop(dynamic.view(), CropGeometry::new(1, 1, 2, 2))?;
        assert_eq!(out.dim(), (2, 2, 3));
        Ok(())
    }

    #[test]
    fn test_random_crop_shares_offset_between_image_and_label() -> Result<()> {
        init_worker_rng(0, 0, 11);
        let image = coordinate_image(20, 30, 3);
        // Label carries the same coordinate code in its only channel.
        let label = coordinate_image(20, 30, 1);

        for _ in 0..20 {
            let (images, labels) = random_crop(&[image.view()], &[label.view()], 7, 9)?;
            assert_eq!(images[0].dim(), (7, 9, 3));
            assert_eq!(labels[0].dim(), (7, 9, 1));
            assert_eq!(images[0][[0, 0, 0]], labels[0][[0, 0, 0]]);
            assert_eq!(images[0][[6, 8, 0]], labels[0][[6, 8, 0]]);
        }
        clear_worker_rng();
        Ok(())
    }

    #[test]
    fn test_random_crop_covers_offset_range() -> Result<()> {
        init_worker_rng(0, 0, 5);
        let image = coordinate_image(4, 4, 1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let (images, _) = random_crop::<_, i32, _, ndarray::Ix3>(&[image.view()], &[], 3, 3)?;
            seen.insert(images[0][[0, 0, 0]]);
        }
        // Offsets (0|1, 0|1) -> four distinct top-left codes, never beyond.
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|v| [0, 10, 1000, 1010].contains(v)));
        clear_worker_rng();
        Ok(())
    }

    #[test]
    fn test_random_crop_is_reproducible_with_seed() -> Result<()> {
        let image = coordinate_image(32, 32, 3);
        init_worker_rng(0, 0, 99);
        let (first, _) = random_crop::<_, i32, _, ndarray::Ix3>(&[image.view()], &[], 8, 8)?;
        init_worker_rng(0, 0, 99);
        let (second, _) = random_crop::<_, i32, _, ndarray::Ix3>(&[image.view()], &[], 8, 8)?;
        assert_eq!(first, second);
        clear_worker_rng();
        Ok(())
    }

    #[test]
    fn test_random_crop_validation_errors() {
        let a = coordinate_image(10, 10, 3);
        let b = coordinate_image(10, 11, 3);
        let label = coordinate_image(9, 10, 1);

        let err = random_crop::<_, i32, _, ndarray::Ix3>(&[a.view(), b.view()], &[], 4, 4).unwrap_err();
        assert!(matches!(err, PreprocessError::ShapeMismatch { .. }));

        let err = random_crop(&[a.view()], &[label.view()], 4, 4).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::ShapeMismatch {
                dimension: "height",
                ..
            }
        ));

        let err = random_crop::<_, i32, _, ndarray::Ix3>(&[a.view()], &[], 11, 4).unwrap_err();
        assert!(matches!(err, PreprocessError::CropSize { .. }));

        let err = random_crop::<i32, i32, ndarray::Ix3, ndarray::Ix3>(&[], &[], 1, 1).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidArgument(_)));
    }

    #[test]
    fn test_center_crop_offsets() -> Result<()> {
        let image = coordinate_image(10, 10, 3);
        let label = coordinate_image(10, 10, 1);
        let (images, labels) = center_crop(&[image.view()], &[label.view()], 4, 4)?;
        // floor((10 - 4) / 2) = 3, rows and cols [3, 7)
        assert_eq!(images[0][[0, 0, 0]], 3030);
        assert_eq!(images[0][[3, 3, 0]], 6060);
        assert_eq!(labels[0][[0, 0, 0]], 3030);
        Ok(())
    }

    #[test]
    fn test_center_crop_odd_difference_biases_top_left() -> Result<()> {
        assert_eq!(center_geometry(9, 8, 4, 5)?, CropGeometry::new(2, 1, 4, 5));
        Ok(())
    }

    #[test]
    fn test_center_crop_pairs_may_differ_in_size() -> Result<()> {
        let small = coordinate_image(6, 6, 1);
        let large = coordinate_image(12, 8, 1);
        let (images, labels) = center_crop(
            &[small.view(), large.view()],
            &[small.view(), large.view()],
            4,
            4,
        )?;
        assert_eq!(images[0][[0, 0, 0]], 1010);
        assert_eq!(images[1][[0, 0, 0]], 4020);
        assert_eq!(labels[1][[0, 0, 0]], 4020);
        Ok(())
    }

    #[test]
    fn test_center_crop_errors() {
        let image = coordinate_image(6, 6, 3);
        let err = center_crop::<_, i32, _, ndarray::Ix3>(&[image.view()], &[], 4, 4).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidArgument(_)));

        let err = center_crop(&[image.view()], &[image.view()], 7, 4).unwrap_err();
        assert!(matches!(err, PreprocessError::CropSize { .. }));
    }

    #[test]
    fn test_center_crop_rejects_label_of_other_size() {
        let image = Array3::<u8>::zeros((10, 10, 3));
        let larger = Array3::<u8>::zeros((20, 20, 1));
        let err = center_crop(&[image.view()], &[larger.view()], 4, 4).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::ShapeMismatch {
                dimension: "height",
                expected: 10,
                actual: 20,
                ..
            }
        ));

        // A smaller label is a shape error too, not a crop-size error.
        let smaller = Array3::<u8>::zeros((10, 6, 1));
        let err = center_crop(&[image.view()], &[smaller.view()], 4, 4).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::ShapeMismatch {
                dimension: "width",
                ..
            }
        ));
    }

    #[test]
    fn test_smallest_size_at_least() {
        assert_eq!(smallest_size_at_least(100, 200, 50), (50, 100));
        assert_eq!(smallest_size_at_least(200, 100, 50), (100, 50));
        assert_eq!(smallest_size_at_least(300, 400, 256), (256, 341));
        assert_eq!(smallest_size_at_least(64, 64, 32), (32, 32));
    }

    #[test]
    fn test_smallest_size_truncates_in_f32() {
        // 224 / 201 * 201 lands just below 224 in f32 and truncates down.
        assert_eq!(smallest_size_at_least(201, 238, 224).0, 223);
    }

    #[test]
    fn test_resize_bilinear_constant_stays_constant() -> Result<()> {
        let image = Array3::<u8>::from_elem((30, 40, 3), 200);
        let resized = resize_bilinear(image.view(), 17, 23)?;
        assert_eq!(resized.dim(), (17, 23, 3));
        assert!(resized.iter().all(|&v| v == 200.0));
        Ok(())
    }

    #[test]
    fn test_resize_bilinear_interpolates() -> Result<()> {
        // 1x2 row [0, 10] upsampled to 1x4 samples at x = 0, 0.5, 1, 1.5.
        let image = Array3::from_shape_vec((1, 2, 1), vec![0.0f32, 10.0])?;
        let resized = resize_bilinear(image.view(), 1, 4)?;
        let row: Vec<f32> = resized.iter().copied().collect();
        assert_eq!(row, vec![0.0, 5.0, 10.0, 10.0]);
        Ok(())
    }

    #[test]
    fn test_resize_nearest_never_blends() -> Result<()> {
        let label = Array3::from_shape_vec((2, 2, 1), vec![1u8, 7, 3, 9])?;
        let resized = resize_nearest(label.view(), 5, 5)?;
        assert!(resized.iter().all(|v| [1, 7, 3, 9].contains(v)));
        assert_eq!(resized[[0, 0, 0]], 1);
        assert_eq!(resized[[4, 4, 0]], 9);
        Ok(())
    }

    #[test]
    fn test_resize_rejects_empty_axes() {
        let empty = Array3::<u8>::zeros((0, 4, 3));
        let err = resize_nearest(empty.view(), 2, 2).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidArgument(_)));
        let err = resize_bilinear(empty.view(), 2, 2).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidArgument(_)));

        let image = Array3::<u8>::zeros((4, 4, 3));
        let err = resize_bilinear(image.view(), 0, 2).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidArgument(_)));
    }

    #[test]
    fn test_aspect_preserving_resize_shapes() -> Result<()> {
        let image = Array3::<u8>::zeros((100, 200, 3));
        let label = Array3::<u8>::zeros((100, 200, 1));
        let (img, lbl) = aspect_preserving_resize(image.view(), label.view(), 50)?;
        assert_eq!(img.dim(), (50, 100, 3));
        assert_eq!(lbl.dim(), (50, 100, 1));
        Ok(())
    }

    #[test]
    fn test_aspect_preserving_resize_rejects_mismatched_label() {
        let image = Array3::<u8>::zeros((100, 200, 3));
        let label = Array3::<u8>::zeros((100, 199, 1));
        let err = aspect_preserving_resize(image.view(), label.view(), 50).unwrap_err();
        assert!(matches!(err, PreprocessError::ShapeMismatch { .. }));

        let err = aspect_preserving_resize(image.view(), image.view(), 0).unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidArgument(_)));
    }
}
