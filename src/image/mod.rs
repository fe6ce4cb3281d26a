//! Image loading, pixel buffers, shapes and saving utilities.

mod load;
mod save;

pub use load::{decode_image, load_image};
pub use save::{save_image, tensor_to_image};

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of channels in color images.
pub const CHANNELS: u32 = 3;

/// Order of color components in memory.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

impl ColorOrder {
    /// Reorder a pixel given in RGB into this order. The mapping is its own inverse.
    #[inline]
    #[must_use]
    pub const fn reorder(self, [a, b, c]: [u8; 3]) -> [u8; 3] {
        match self {
            Self::Rgb => [a, b, c],
            Self::Bgr => [c, b, a],
        }
    }
}

/// Shape descriptor paired with a flattened tensor.
///
/// Width and height may be unset while a pipeline's output size is not yet
/// known; they are always resolved once an image has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageShape {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub channels: u32,
}

impl ImageShape {
    /// A fully resolved shape.
    #[must_use]
    pub const fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            channels,
        }
    }

    /// A shape whose width and height are not known yet.
    #[must_use]
    pub const fn unresolved(channels: u32) -> Self {
        Self {
            width: None,
            height: None,
            channels,
        }
    }

    /// `width * height * channels`, or `None` while a dimension is unset.
    #[must_use]
    pub fn number_of_elements(&self) -> Option<u64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(u64::from(w) * u64::from(h) * u64::from(self.channels)),
            _ => None,
        }
    }

    /// Width and height, or `None` while either is unset.
    #[must_use]
    pub const fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dim = |d: Option<u32>| d.map_or_else(|| "?".to_string(), |v| v.to_string());
        write!(f, "{}x{}x{}", dim(self.width), dim(self.height), self.channels)
    }
}

/// Decoded 8-bit, 3-channel pixel grid.
///
/// Samples are stored in the buffer's [`ColorOrder`]: a BGR buffer holds the
/// blue component first. Geometric operations never look at channel values,
/// so the order carries through every image transform unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    samples: RgbImage,
    color_order: ColorOrder,
}

impl PixelBuffer {
    /// Convert a decoded image into a buffer ordered per `color_order`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has a zero dimension.
    pub fn from_image(image: &DynamicImage, color_order: ColorOrder) -> Result<Self> {
        let mut samples = image.to_rgb8();
        if color_order == ColorOrder::Bgr {
            for pixel in samples.pixels_mut() {
                pixel.0 = color_order.reorder(pixel.0);
            }
        }
        Self::from_samples(samples, color_order)
    }

    /// Wrap samples that are already laid out in `color_order`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has a zero dimension.
    pub fn from_samples(samples: RgbImage, color_order: ColorOrder) -> Result<Self> {
        if samples.width() == 0 || samples.height() == 0 {
            return Err(Error::invalid_argument(
                "image",
                format!(
                    "dimensions must be positive, got {}x{}",
                    samples.width(),
                    samples.height()
                ),
            ));
        }
        Ok(Self {
            samples,
            color_order,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.samples.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.samples.height()
    }

    #[must_use]
    pub const fn color_order(&self) -> ColorOrder {
        self.color_order
    }

    /// Raw samples in the buffer's color order.
    #[must_use]
    pub const fn samples(&self) -> &RgbImage {
        &self.samples
    }

    /// Sample triple at `(x, y)` in the buffer's color order.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.samples.get_pixel(x, y).0
    }

    #[must_use]
    pub fn shape(&self) -> ImageShape {
        ImageShape::new(self.width(), self.height(), CHANNELS)
    }

    /// Convert back to a standard RGB image.
    #[must_use]
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut rgb = self.samples.clone();
        if self.color_order == ColorOrder::Bgr {
            for pixel in rgb.pixels_mut() {
                pixel.0 = self.color_order.reorder(pixel.0);
            }
        }
        rgb
    }

    /// Replace the samples, keeping the color order. Used by geometric stages.
    pub(crate) fn with_samples(&self, samples: RgbImage) -> Result<Self> {
        Self::from_samples(samples, self.color_order)
    }
}
