use ndarray::{Array3, ArrayView3};

/// A decoded `(image, label)` pair as it arrives from an external reader.
///
/// - `image`: `(height, width, 3)` pixel values (`u8`, `u16` or `f32`)
/// - `label`: `(height, width, 1)` integer class indices
///
/// Shapes are not checked here; the preprocessing stages check them at call
/// time.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationPair<A, L> {
    pub image: Array3<A>,
    pub label: Array3<L>,
}

impl<A, L> SegmentationPair<A, L> {
    pub fn new(image: Array3<A>, label: Array3<L>) -> Self {
        Self { image, label }
    }
}

/// A preprocessed training or evaluation example.
///
/// `image` is channel-mean-subtracted `f32` data and `label` holds `i32`
/// class indices. Both share the same height and width.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationSample {
    pub image: Array3<f32>,
    pub label: Array3<i32>,
}

impl SegmentationSample {
    pub fn new(image: Array3<f32>, label: Array3<i32>) -> Self {
        Self { image, label }
    }

    /// Spatial size `(height, width)` shared by image and label.
    pub fn dims(&self) -> (usize, usize) {
        let (height, width, _) = self.image.dim();
        (height, width)
    }

    pub fn image(&self) -> ArrayView3<'_, f32> {
        self.image.view()
    }

    pub fn label(&self) -> ArrayView3<'_, i32> {
        self.label.view()
    }

    /// Splits the sample into its `(image, label)` arrays.
    pub fn into_parts(self) -> (Array3<f32>, Array3<i32>) {
        (self.image, self.label)
    }
}

impl From<(Array3<f32>, Array3<i32>)> for SegmentationSample {
    fn from((image, label): (Array3<f32>, Array3<i32>)) -> Self {
        Self { image, label }
    }
}
