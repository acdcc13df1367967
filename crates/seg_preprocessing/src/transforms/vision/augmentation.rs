use crate::rng::{worker_gen_f64, worker_id};
use crate::sample::SegmentationSample;
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use ndarray::{s, Array3, ArrayView3};

// ============================================================================
// Flips
// ============================================================================

/// Mirrors a (H, W, C) array along its width axis.
pub fn flip_left_right<A: Clone>(array: ArrayView3<'_, A>) -> Array3<A> {
    array.slice(s![.., ..;-1, ..]).to_owned()
}

/// Mirrors a (H, W, C) array along its height axis.
pub fn flip_up_down<A: Clone>(array: ArrayView3<'_, A>) -> Array3<A> {
    array.slice(s![..;-1, .., ..]).to_owned()
}

/// Flip decision drawn once per call and applied to both image and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlipDecision {
    pub left_right: bool,
    pub up_down: bool,
}

impl FlipDecision {
    /// Draws one value per axis from the worker RNG; an axis flips when its
    /// draw is strictly greater than `threshold`.
    pub fn draw(threshold: f64) -> Self {
        let val_lr = worker_gen_f64();
        let val_ud = worker_gen_f64();
        let decision = Self {
            left_right: val_lr > threshold,
            up_down: val_ud > threshold,
        };
        tracing::debug!(worker_id = worker_id(), val_lr, val_ud, ?decision, "flip draw");
        decision
    }

    /// Applies this decision to one array.
    pub fn apply_to<A: Clone>(&self, array: Array3<A>) -> Array3<A> {
        let array = if self.left_right {
            flip_left_right(array.view())
        } else {
            array
        };
        if self.up_down {
            flip_up_down(array.view())
        } else {
            array
        }
    }
}

// ============================================================================
// RandomPairFlip
// ============================================================================

/// Randomly flips image and label together, left-right and up-down
/// independently.
///
/// Each axis flips when a uniform draw in `[0, 1)` exceeds `threshold`, so
/// `threshold = 0.5` flips each axis half the time.
///
/// # Example
/// ```ignore
/// let flip = RandomPairFlip::new(0.5)?;
/// let augmented = flip.apply(sample)?;
/// ```
#[derive(Debug)]
pub struct RandomPairFlip {
    threshold: f64,
}

impl RandomPairFlip {
    pub fn new(threshold: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&threshold),
            "Flip threshold must be in [0.0, 1.0] range (got {})",
            threshold
        );
        Ok(Self { threshold })
    }
}

impl Default for RandomPairFlip {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl Transform<SegmentationSample, SegmentationSample> for RandomPairFlip {
    fn apply(&self, sample: SegmentationSample) -> Result<SegmentationSample> {
        let decision = FlipDecision::draw(self.threshold);
        Ok(SegmentationSample {
            image: decision.apply_to(sample.image),
            label: decision.apply_to(sample.label),
        })
    }
}
