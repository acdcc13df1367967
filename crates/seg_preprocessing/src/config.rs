//! src/config.rs
//!
//! Configuration for the segmentation preprocessing pipeline.
//!
//! Example:
//! ```ignore
//! let config = PreprocessConfig::builder()
//!     .output_size(321, 321)
//!     .resize_side_range(256, 512)
//!     .training(true)
//!     .seed(42)
//!     .build()?;
//! ```
//!
//! Channel means are fixed constants (see [`crate::pipeline::CHANNEL_MEANS`])
//! and are not part of this struct.

use crate::error::{PreprocessError, Result};
use serde::{Deserialize, Serialize};

/// Default lower bound of the random resize side in training.
pub const RESIZE_SIDE_MIN: usize = 256;
/// Default upper bound of the random resize side in training.
pub const RESIZE_SIDE_MAX: usize = 512;

/// Configuration for the segmentation preprocessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Height of the output crop
    pub output_height: usize,
    /// Width of the output crop
    pub output_width: usize,
    /// Smallest resize side drawn in training; the fixed resize side in eval
    pub resize_side_min: usize,
    /// Largest resize side drawn in training (inclusive)
    pub resize_side_max: usize,
    /// Train path (random resize, random crop, flips) or eval path
    pub is_training: bool,
    /// Seed for the calling thread's worker RNG
    pub seed: Option<u64>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            output_height: 224,
            output_width: 224,
            resize_side_min: RESIZE_SIDE_MIN,
            resize_side_max: RESIZE_SIDE_MAX,
            is_training: false,
            seed: None,
        }
    }
}

impl PreprocessConfig {
    pub fn builder() -> PreprocessConfigBuilder {
        PreprocessConfigBuilder::default()
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PreprocessError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks sizes are positive and `resize_side_min <= resize_side_max`.
    pub fn validate(&self) -> Result<()> {
        if self.output_height == 0 || self.output_width == 0 {
            return Err(PreprocessError::Config(format!(
                "Output size must be positive (got {}x{})",
                self.output_height, self.output_width
            )));
        }
        validate_resize_range(self.resize_side_min, self.resize_side_max)
            .map_err(|e| PreprocessError::Config(e.to_string()))
    }
}

/// Checks `0 < resize_side_min <= resize_side_max`.
pub(crate) fn validate_resize_range(resize_side_min: usize, resize_side_max: usize) -> Result<()> {
    if resize_side_min == 0 || resize_side_min > resize_side_max {
        return Err(PreprocessError::InvalidArgument(format!(
            "resize side range must satisfy 0 < min <= max (got [{resize_side_min}, {resize_side_max}])"
        )));
    }
    Ok(())
}

/// Builder for PreprocessConfig with method chaining
#[derive(Default)]
pub struct PreprocessConfigBuilder {
    config: PreprocessConfig,
}

impl PreprocessConfigBuilder {
    /// Set the output crop size
    pub fn output_size(mut self, height: usize, width: usize) -> Self {
        self.config.output_height = height;
        self.config.output_width = width;
        self
    }

    /// Set the inclusive range the training resize side is drawn from.
    /// In eval mode only `min` is used.
    pub fn resize_side_range(mut self, min: usize, max: usize) -> Self {
        self.config.resize_side_min = min;
        self.config.resize_side_max = max;
        self
    }

    /// Set a single resize side (eval), equivalent to `resize_side_range(side, side)`
    pub fn resize_side(self, side: usize) -> Self {
        self.resize_side_range(side, side)
    }

    pub fn training(mut self, is_training: bool) -> Self {
        self.config.is_training = is_training;
        self
    }

    /// Set the random seed for reproducible augmentation.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate and build the final configuration.
    pub fn build(self) -> Result<PreprocessConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
