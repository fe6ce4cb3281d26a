//! Declarative pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::ColorOrder;

/// Defaults applied when a configuration leaves a value out.
pub mod defaults {
    use crate::image::ColorOrder;

    use super::Interpolation;

    /// Divisor mapping 8-bit samples into `[0, 1]`.
    pub const RESCALE_FACTOR: f32 = 255.0;

    /// Channel order used when loading.
    pub const COLOR_ORDER: ColorOrder = ColorOrder::Rgb;

    /// Sampling used by resize and rotate.
    pub const INTERPOLATION: Interpolation = Interpolation::Nearest;
}

/// Pixel sampling policy for geometric stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Take the nearest source sample, no blending.
    #[default]
    Nearest,
    /// Linear blend of neighbouring samples.
    Bilinear,
    /// Cubic blend of neighbouring samples.
    Bicubic,
}

/// Settings of the load stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Channel order of the loaded samples and of the output tensor.
    pub color_order: ColorOrder,
}

/// A geometric stage applied to the pixel buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageTransform {
    /// Resize to exact output dimensions.
    Resize {
        output_width: u32,
        output_height: u32,
        #[serde(default)]
        interpolation: Interpolation,
    },
    /// Remove margins from each edge.
    Crop {
        #[serde(default)]
        left: u32,
        #[serde(default)]
        right: u32,
        #[serde(default)]
        top: u32,
        #[serde(default)]
        bottom: u32,
    },
    /// Rotate clockwise by `degrees`.
    Rotate {
        degrees: f32,
        #[serde(default)]
        interpolation: Interpolation,
    },
    /// Write the current buffer to `<dir>/<id>.png`.
    Save { dir: PathBuf },
}

impl ImageTransform {
    /// Short stage name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::Crop { .. } => "crop",
            Self::Rotate { .. } => "rotate",
            Self::Save { .. } => "save",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Resize {
                output_width,
                output_height,
                ..
            } => {
                if *output_width == 0 {
                    return Err(Error::invalid_argument(
                        "output_width",
                        "must be greater than 0",
                    ));
                }
                if *output_height == 0 {
                    return Err(Error::invalid_argument(
                        "output_height",
                        "must be greater than 0",
                    ));
                }
            }
            Self::Rotate { degrees, .. } => {
                if !degrees.is_finite() {
                    return Err(Error::invalid_argument("degrees", "must be finite"));
                }
            }
            // Crop margins can only be checked against a concrete input size.
            Self::Crop { .. } => {}
            Self::Save { dir } => {
                if dir.as_os_str().is_empty() {
                    return Err(Error::invalid_argument("dir", "must not be empty"));
                }
            }
        }
        Ok(())
    }
}

/// A numeric stage applied to the float tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TensorTransform {
    /// Divide every value by `scaling_factor`.
    Rescale {
        #[serde(default = "default_scaling_factor")]
        scaling_factor: f32,
    },
    /// Per-channel `(value - mean) / std`, channels in the load order.
    Normalize { mean: [f32; 3], std: [f32; 3] },
}

const fn default_scaling_factor() -> f32 {
    defaults::RESCALE_FACTOR
}

impl TensorTransform {
    /// Short stage name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rescale { .. } => "rescale",
            Self::Normalize { .. } => "normalize",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Rescale { scaling_factor } => {
                if !scaling_factor.is_finite() || *scaling_factor == 0.0 {
                    return Err(Error::invalid_argument(
                        "scaling_factor",
                        "must be finite and non-zero",
                    ));
                }
            }
            Self::Normalize { mean, std } => {
                if mean.iter().any(|m| !m.is_finite()) {
                    return Err(Error::invalid_argument("mean", "must be finite"));
                }
                if std.iter().any(|s| !s.is_finite() || *s == 0.0) {
                    return Err(Error::invalid_argument(
                        "std",
                        "must be finite and non-zero",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Complete, ordered description of a preprocessing pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub load: LoadConfig,
    pub image_transforms: Vec<ImageTransform>,
    pub tensor_transforms: Vec<TensorTransform>,
}

impl PreprocessingConfig {
    /// Validate every stage.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        for transform in &self.image_transforms {
            transform.validate()?;
        }
        for transform in &self.tensor_transforms {
            transform.validate()?;
        }
        Ok(())
    }

    /// Parse a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document does not describe a pipeline.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::Config { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let config = PreprocessingConfig::from_json_str(
            r#"{
                "load": { "color_order": "bgr" },
                "image_transforms": [
                    { "type": "resize", "output_width": 4, "output_height": 2 },
                    { "type": "crop", "left": 1 },
                    { "type": "rotate", "degrees": 90, "interpolation": "bilinear" }
                ],
                "tensor_transforms": [ { "type": "rescale" } ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.load.color_order, ColorOrder::Bgr);
        assert_eq!(
            config.image_transforms,
            vec![
                ImageTransform::Resize {
                    output_width: 4,
                    output_height: 2,
                    interpolation: Interpolation::Nearest,
                },
                ImageTransform::Crop {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                },
                ImageTransform::Rotate {
                    degrees: 90.0,
                    interpolation: Interpolation::Bilinear,
                },
            ]
        );
        assert_eq!(
            config.tensor_transforms,
            vec![TensorTransform::Rescale {
                scaling_factor: defaults::RESCALE_FACTOR
            }]
        );
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = PreprocessingConfig::from_json_str("{}").unwrap();
        assert_eq!(config.load.color_order, defaults::COLOR_ORDER);
        assert!(config.image_transforms.is_empty());
        assert!(config.tensor_transforms.is_empty());
    }

    #[test]
    fn test_unknown_stage_rejected() {
        let err = PreprocessingConfig::from_json_str(
            r#"{ "image_transforms": [ { "type": "shear" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_validate_zero_resize() {
        let config = PreprocessingConfig {
            image_transforms: vec![ImageTransform::Resize {
                output_width: 0,
                output_height: 4,
                interpolation: Interpolation::Nearest,
            }],
            ..PreprocessingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidArgument { name, .. }) if name == "output_width"
        ));
    }

    #[test]
    fn test_validate_zero_scaling_factor() {
        let config = PreprocessingConfig {
            tensor_transforms: vec![TensorTransform::Rescale {
                scaling_factor: 0.0,
            }],
            ..PreprocessingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_std() {
        let config = PreprocessingConfig {
            tensor_transforms: vec![TensorTransform::Normalize {
                mean: [0.5; 3],
                std: [0.5, 0.0, 0.5],
            }],
            ..PreprocessingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_nan_rotation() {
        let config = PreprocessingConfig {
            image_transforms: vec![ImageTransform::Rotate {
                degrees: f32::NAN,
                interpolation: Interpolation::Nearest,
            }],
            ..PreprocessingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
