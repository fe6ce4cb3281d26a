//! # `imgprep`
//!
//! Declarative image preprocessing: decode an image, run it through a fixed
//! sequence of geometric stages (resize, crop, rotate) and numeric stages
//! (rescale, normalize), and hand back a flat `f32` tensor with its shape.
//!
//! ## Example
//!
//! ```no_run
//! use imgprep::{ColorOrder, Interpolation, Preprocessing};
//!
//! # fn main() -> imgprep::Result<()> {
//! let preprocessing = Preprocessing::builder()
//!     .load(ColorOrder::Bgr)
//!     .resize(224, 224, Interpolation::Nearest)
//!     .rescale_default()
//!     .build()?;
//!
//! let (data, shape) = preprocessing.handle_file("cat.png")?;
//! assert_eq!(data.len() as u64, shape.number_of_elements().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! The flat tensor is laid out row-major over (height, width, channels);
//! channels follow the load-time [`ColorOrder`].

pub mod error;
pub mod image;
pub mod pipeline;

pub use error::{Error, Result};
pub use crate::image::{ColorOrder, ImageShape, PixelBuffer};
pub use pipeline::{
    ImageTransform, Interpolation, Preprocessing, PreprocessingBuilder, PreprocessingConfig,
    TensorTransform,
};
