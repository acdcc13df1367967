//! Paired image/label preprocessing for semantic-segmentation training.
//!
//! An RGB image `(H, W, 3)` and its label map `(H, W, 1)` are resized,
//! cropped, optionally flipped and mean-normalized with the same geometry,
//! producing an `f32` image and an `i32` label of a fixed output size.
//!
//! ```ignore
//! use seg_preprocessing::{preprocess_image, RESIZE_SIDE_MAX, RESIZE_SIDE_MIN};
//!
//! let (image, label) = preprocess_image(
//!     image.view(),
//!     321,
//!     321,
//!     label.view(),
//!     true,
//!     RESIZE_SIDE_MIN,
//!     RESIZE_SIDE_MAX,
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod rng;
pub mod sample;
pub mod transforms;

pub use config::{PreprocessConfig, PreprocessConfigBuilder, RESIZE_SIDE_MAX, RESIZE_SIDE_MIN};
pub use error::{PreprocessError, Result};
pub use pipeline::{
    preprocess_for_eval, preprocess_for_train, preprocess_image, SegmentationPreprocessor,
    CHANNEL_MEANS,
};
pub use rng::{clear_worker_rng, init_worker_rng};
pub use sample::{SegmentationPair, SegmentationSample};
pub use transforms::Transform;
