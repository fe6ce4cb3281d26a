//! Image loading utilities.

use std::path::Path;

use crate::error::{Error, Result};

use super::{ColorOrder, PixelBuffer};

/// Decode encoded image bytes into a pixel buffer ordered per `color_order`.
///
/// Any format enabled in the `image` crate is accepted; the format is guessed
/// from the content. Images with alpha or a single channel are converted to
/// three 8-bit color channels.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not a decodable image.
pub fn decode_image(bytes: &[u8], color_order: ColorOrder) -> Result<PixelBuffer> {
    let img = image::load_from_memory(bytes).map_err(|source| Error::Decode { source })?;
    PixelBuffer::from_image(&img, color_order)
}

/// Load an image from disk into a pixel buffer ordered per `color_order`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P, color_order: ColorOrder) -> Result<PixelBuffer> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );

    PixelBuffer::from_image(&img, color_order)
}
