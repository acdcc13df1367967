//! src/transforms/vision/mod.rs
//!
//! Paired image/label transforms for segmentation preprocessing.
//!
//! # Module Organization
//!
//! ```text
//! transforms/vision/
//! ├── validate.rs      → Rank and height/width agreement checks
//! ├── geometric.rs     → Crop, random/center crop, aspect-preserving resize
//! ├── augmentation.rs  → Synchronized left-right / up-down flips
//! ├── photometric.rs   → Channel mean subtraction
//! └── conversion.rs    → Decoded `image` buffers → arrays
//! ```
//!
//! Every geometric operation takes its parameters explicitly so that the
//! same offset, size or flip decision can be handed to an image and to its
//! label.
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::transforms::vision::{aspect_preserving_resize, center_crop, subtract_mean};
//!
//! let (image, label) = aspect_preserving_resize(image.view(), label.view(), 256)?;
//! let (images, labels) = center_crop(&[image.view()], &[label.view()], 224, 224)?;
//! let image = subtract_mean(images[0].view(), &[123.68, 116.78, 103.94])?;
//! ```

pub mod augmentation;
pub mod conversion;
pub mod geometric;
pub mod photometric;
pub mod validate;

pub use augmentation::{flip_left_right, flip_up_down, FlipDecision, RandomPairFlip};
pub use conversion::{image_to_array, label16_to_array, label_to_array};
pub use geometric::{
    aspect_preserving_resize, center_crop, center_geometry, crop, random_crop, resize_bilinear,
    resize_nearest, smallest_size_at_least, CropGeometry,
};
pub use photometric::{subtract_mean, MeanSubtraction};
pub use validate::{as_rank3, validate_matching, validate_shapes};
