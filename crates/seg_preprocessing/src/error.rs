//! src/error.rs
//!
//! Error type shared by every preprocessing stage.
//!
//! All variants describe caller programming errors (bad shapes, bad sizes,
//! bad configuration). They are raised by precondition checks before the
//! guarded transform runs, so a failed call never yields partial output.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessError {
    /// An array did not have the expected number of dimensions.
    #[error("Wrong rank for tensor {name} [expected {expected}] [actual {actual}]")]
    Rank {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Height or width disagreed across arrays that must share geometry.
    #[error("Wrong {dimension} for tensor {name} [expected {expected}] [actual {actual}]")]
    ShapeMismatch {
        name: String,
        dimension: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The requested crop does not fit inside the source array.
    #[error(
        "Crop size greater than the image size: image {height}x{width}, \
         crop {crop_height}x{crop_width} at offset ({offset_height}, {offset_width})"
    )]
    CropSize {
        height: usize,
        width: usize,
        offset_height: usize,
        offset_width: usize,
        crop_height: usize,
        crop_width: usize,
    },

    /// Normalization parameters do not match the image.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A scalar or list argument is outside its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
