//! src/pipeline.rs
//!
//! Train and eval preprocessing for `(image, label)` segmentation pairs.
//!
//! ```text
//!   (image, label)
//!         │
//!         ↓
//!   aspect-preserving resize    train: side ~ U[min, max]   eval: fixed side
//!         │
//!         ↓
//!   crop to output size         train: random offset        eval: centred
//!         │
//!         ↓
//!   cast (f32 image, i32 label)
//!         │
//!         ↓
//!   flips (train only)          left-right, up-down, each when draw > 0.5
//!         │
//!         ↓
//!   channel mean subtraction    image only
//! ```
//!
//! Every random value is drawn from the worker RNG inside the call and
//! shared by image and label, so output pixel (i, j) of the image always
//! lines up with output pixel (i, j) of the label.

use crate::config::{validate_resize_range, PreprocessConfig};
use crate::error::{PreprocessError, Result};
use crate::rng::{init_worker_rng, worker_gen_range, worker_id};
use crate::sample::{SegmentationPair, SegmentationSample};
use crate::transforms::vision::{
    aspect_preserving_resize, center_crop, random_crop, subtract_mean, FlipDecision,
};
use crate::transforms::Transform;
use ndarray::{Array3, ArrayView, Dimension};
use tracing::{debug, instrument};

pub const R_MEAN: f32 = 123.68;
pub const G_MEAN: f32 = 116.78;
pub const B_MEAN: f32 = 103.94;

/// Per-channel means subtracted from every output image, in RGB order.
pub const CHANNEL_MEANS: [f32; 3] = [R_MEAN, G_MEAN, B_MEAN];

/// A flip is applied when its uniform draw is strictly above this value.
const FLIP_THRESHOLD: f64 = 0.5;

/// Training preprocessing: random rescale, random crop, random flips and
/// mean subtraction.
///
/// `resize_side` is drawn uniformly from `[resize_side_min,
/// resize_side_max]` (inclusive) on every call. Returns an
/// `(output_height, output_width, 3)` image and an `(output_height,
/// output_width, 1)` label.
#[instrument(level = "debug", skip(image, label))]
pub fn preprocess_for_train<A, L, D, E>(
    image: ArrayView<'_, A, D>,
    label: ArrayView<'_, L, E>,
    output_height: usize,
    output_width: usize,
    resize_side_min: usize,
    resize_side_max: usize,
) -> Result<(Array3<f32>, Array3<i32>)>
where
    A: Copy + Into<f32>,
    L: Copy + Into<i32>,
    D: Dimension,
    E: Dimension,
{
    validate_resize_range(resize_side_min, resize_side_max)?;
    let resize_side = worker_gen_range(resize_side_min..=resize_side_max);
    debug!(worker_id = worker_id(), resize_side, "drew resize side");

    let (image, label) = aspect_preserving_resize(image, label, resize_side)?;
    let (images, labels) = random_crop(
        &[image.view()],
        &[label.view()],
        output_height,
        output_width,
    )?;
    let (image, label) = single_pair(images, labels)?;
    let label: Array3<i32> = label.mapv(Into::into);

    let flips = FlipDecision::draw(FLIP_THRESHOLD);
    let image = flips.apply_to(image);
    let label = flips.apply_to(label);

    Ok((subtract_mean(image.view(), &CHANNEL_MEANS)?, label))
}

/// Evaluation preprocessing: fixed rescale, centre crop and mean
/// subtraction. Deterministic.
#[instrument(level = "debug", skip(image, label))]
pub fn preprocess_for_eval<A, L, D, E>(
    image: ArrayView<'_, A, D>,
    label: ArrayView<'_, L, E>,
    output_height: usize,
    output_width: usize,
    resize_side: usize,
) -> Result<(Array3<f32>, Array3<i32>)>
where
    A: Copy + Into<f32>,
    L: Copy + Into<i32>,
    D: Dimension,
    E: Dimension,
{
    let (image, label) = aspect_preserving_resize(image, label, resize_side)?;
    let (images, labels) = center_crop(
        &[image.view()],
        &[label.view()],
        output_height,
        output_width,
    )?;
    let (image, label) = single_pair(images, labels)?;

    Ok((
        subtract_mean(image.view(), &CHANNEL_MEANS)?,
        label.mapv(Into::into),
    ))
}

/// Runs the train path when `is_training`, otherwise the eval path with
/// `resize_side_min` as the fixed resize side.
pub fn preprocess_image<A, L, D, E>(
    image: ArrayView<'_, A, D>,
    output_height: usize,
    output_width: usize,
    label: ArrayView<'_, L, E>,
    is_training: bool,
    resize_side_min: usize,
    resize_side_max: usize,
) -> Result<(Array3<f32>, Array3<i32>)>
where
    A: Copy + Into<f32>,
    L: Copy + Into<i32>,
    D: Dimension,
    E: Dimension,
{
    if is_training {
        preprocess_for_train(
            image,
            label,
            output_height,
            output_width,
            resize_side_min,
            resize_side_max,
        )
    } else {
        preprocess_for_eval(image, label, output_height, output_width, resize_side_min)
    }
}

fn single_pair<L>(
    images: Vec<Array3<f32>>,
    labels: Vec<Array3<L>>,
) -> Result<(Array3<f32>, Array3<L>)> {
    match (images.into_iter().next(), labels.into_iter().next()) {
        (Some(image), Some(label)) => Ok((image, label)),
        _ => Err(PreprocessError::InvalidArgument(
            "crop returned no (image, label) pair".into(),
        )),
    }
}

// ============================================================================
// SegmentationPreprocessor
// ============================================================================

/// [`preprocess_image`] bound to a [`PreprocessConfig`], usable as a
/// [`Transform`] from a raw [`SegmentationPair`] to a [`SegmentationSample`].
///
/// # Example
/// ```ignore
/// let config = PreprocessConfig::builder()
///     .output_size(321, 321)
///     .training(true)
///     .build()?;
/// let preprocessor = SegmentationPreprocessor::new(config)?;
/// let sample = preprocessor.apply(SegmentationPair::new(image, label))?;
/// ```
#[derive(Debug, Clone)]
pub struct SegmentationPreprocessor {
    config: PreprocessConfig,
}

impl SegmentationPreprocessor {
    /// Validates `config`. When it carries a seed, the calling thread's
    /// worker RNG is seeded with it (worker 0, epoch 0).
    ///
    /// Draws come from the thread-local worker RNG of whichever thread calls
    /// [`process`](Self::process), not from the preprocessor itself. Other
    /// threads are seeded with [`seed_worker`](Self::seed_worker) or
    /// [`init_worker_rng`]. Constructing another seeded preprocessor on the
    /// same thread restarts that thread's sequence.
    pub fn new(config: PreprocessConfig) -> Result<Self> {
        config.validate()?;
        if let Some(seed) = config.seed {
            init_worker_rng(0, 0, seed);
        }
        Ok(Self { config })
    }

    /// Seeds the calling thread's worker RNG from the configured seed.
    ///
    /// Returns `false` and leaves the thread untouched when the config has no
    /// seed.
    pub fn seed_worker(&self, worker_id: usize, epoch: usize) -> bool {
        match self.config.seed {
            Some(seed) => {
                init_worker_rng(worker_id, epoch, seed);
                true
            }
            None => false,
        }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Preprocesses borrowed arrays according to the bound config.
    pub fn process<A, L, D, E>(
        &self,
        image: ArrayView<'_, A, D>,
        label: ArrayView<'_, L, E>,
    ) -> Result<SegmentationSample>
    where
        A: Copy + Into<f32>,
        L: Copy + Into<i32>,
        D: Dimension,
        E: Dimension,
    {
        let PreprocessConfig {
            output_height,
            output_width,
            resize_side_min,
            resize_side_max,
            is_training,
            ..
        } = self.config;
        preprocess_image(
            image,
            output_height,
            output_width,
            label,
            is_training,
            resize_side_min,
            resize_side_max,
        )
        .map(SegmentationSample::from)
    }
}

impl<A, L> Transform<SegmentationPair<A, L>, SegmentationSample> for SegmentationPreprocessor
where
    A: Copy + Into<f32>,
    L: Copy + Into<i32>,
{
    fn apply(&self, pair: SegmentationPair<A, L>) -> anyhow::Result<SegmentationSample> {
        Ok(self.process(pair.image.view(), pair.label.view())?)
    }
}
