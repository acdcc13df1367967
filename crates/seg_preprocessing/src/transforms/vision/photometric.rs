use crate::error::{PreprocessError, Result};
use crate::sample::SegmentationSample;
use crate::transforms::vision::validate::as_rank3;
use crate::transforms::Transform;
use ndarray::{Array3, ArrayView, Axis, Dimension};

// ============================================================================
// Mean subtraction
// ============================================================================

/// Subtracts `means[c]` from every value of channel `c`.
///
/// # Mathematical Operation:
/// ```text
/// output[h, w, c] = input[h, w, c] - means[c]
/// ```
///
/// The input must be rank 3 with exactly `means.len()` channels, otherwise a
/// [`PreprocessError::Config`] is returned. The input is never modified.
pub fn subtract_mean<D>(image: ArrayView<'_, f32, D>, means: &[f32]) -> Result<Array3<f32>>
where
    D: Dimension,
{
    let image = as_rank3(image, "image")?;
    let (_, _, num_channels) = image.dim();
    if means.len() != num_channels {
        return Err(PreprocessError::Config(format!(
            "len(means) must match the number of channels (got {} means for {} channels)",
            means.len(),
            num_channels
        )));
    }

    let mut output = image.to_owned();
    for (mut channel, &mean) in output.axis_iter_mut(Axis(2)).zip(means) {
        channel.mapv_inplace(|v| v - mean);
    }
    Ok(output)
}

/// Channel-wise mean subtraction on the image of a [`SegmentationSample`].
///
/// # Example
/// ```ignore
/// let norm = MeanSubtraction::rgb_means();
/// let normalized = norm.apply(sample)?;
/// ```
#[derive(Debug, Clone)]
pub struct MeanSubtraction {
    means: Vec<f32>,
}

impl MeanSubtraction {
    pub fn new(means: &[f32]) -> Result<Self> {
        if means.is_empty() {
            return Err(PreprocessError::Config(
                "Normalization means cannot be empty".into(),
            ));
        }
        Ok(Self {
            means: means.to_vec(),
        })
    }

    /// The fixed RGB channel means used by the segmentation pipelines.
    pub fn rgb_means() -> Self {
        Self {
            means: crate::pipeline::CHANNEL_MEANS.to_vec(),
        }
    }

    pub fn means(&self) -> &[f32] {
        &self.means
    }
}

impl Transform<SegmentationSample, SegmentationSample> for MeanSubtraction {
    fn apply(&self, sample: SegmentationSample) -> anyhow::Result<SegmentationSample> {
        let image = subtract_mean(sample.image.view(), &self.means)?;
        Ok(SegmentationSample {
            image,
            label: sample.label,
        })
    }
}
