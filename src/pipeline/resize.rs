//! Resize stage.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{Error, Result};
use crate::image::PixelBuffer;

use super::config::Interpolation;

/// Resize a buffer to exactly `output_width x output_height`.
///
/// Nearest sampling maps output pixel `(x, y)` to source pixel
/// `(x * src_w / out_w, y * src_h / out_h)` with integer division, so integer
/// upscales replicate each source pixel into a block.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if either output dimension is zero.
pub fn resize(
    buffer: &PixelBuffer,
    output_width: u32,
    output_height: u32,
    interpolation: Interpolation,
) -> Result<PixelBuffer> {
    if output_width == 0 || output_height == 0 {
        return Err(Error::invalid_argument(
            "resize",
            format!("output size must be positive, got {output_width}x{output_height}"),
        ));
    }

    let src = buffer.samples();
    let resized = match interpolation {
        Interpolation::Nearest => resize_nearest(src, output_width, output_height),
        Interpolation::Bilinear => {
            imageops::resize(src, output_width, output_height, FilterType::Triangle)
        }
        Interpolation::Bicubic => {
            imageops::resize(src, output_width, output_height, FilterType::CatmullRom)
        }
    };

    buffer.with_samples(resized)
}

#[allow(clippy::cast_possible_truncation)]
fn resize_nearest(src: &RgbImage, output_width: u32, output_height: u32) -> RgbImage {
    let (src_w, src_h) = (u64::from(src.width()), u64::from(src.height()));
    let (out_w, out_h) = (u64::from(output_width), u64::from(output_height));

    RgbImage::from_fn(output_width, output_height, |x, y| {
        // Safe: x < out_w, so the quotient is < src_w which fits in u32
        let src_x = (u64::from(x) * src_w / out_w) as u32;
        let src_y = (u64::from(y) * src_h / out_h) as u32;
        *src.get_pixel(src_x, src_y)
    })
}
