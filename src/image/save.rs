//! Image saving and tensor-to-image reconstruction.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::{Error, Result};

use super::{ColorOrder, ImageShape, PixelBuffer, CHANNELS};

/// Save a pixel buffer as an RGB image file.
///
/// The format is inferred from the extension. Parent directories are not
/// created.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or written.
pub fn save_image<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<()> {
    let path = path.as_ref();

    buffer
        .to_rgb_image()
        .save(path)
        .map_err(|source| Error::ImageSave {
            path: path.to_path_buf(),
            source,
        })
}

/// Rebuild an RGB image from a flat `(height, width, channels)` tensor.
///
/// Each value is multiplied by `scaling_factor`, rounded and clamped to
/// `[0, 255]`; channels are read in `color_order`. For tensors produced by
/// nearest-neighbour resizing, cropping or right-angle rotation followed by a
/// single rescale with the same factor, the original samples are recovered
/// exactly.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the shape is unresolved, is not a
/// three-channel shape, or disagrees with the data length.
pub fn tensor_to_image(
    data: &[f32],
    shape: &ImageShape,
    color_order: ColorOrder,
    scaling_factor: f32,
) -> Result<RgbImage> {
    let (width, height) = shape.dimensions().ok_or_else(|| Error::ShapeMismatch {
        expected: "resolved width and height".to_string(),
        actual: shape.to_string(),
    })?;

    if shape.channels != CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: format!("{CHANNELS} channels"),
            actual: format!("{} channels", shape.channels),
        });
    }

    let expected_len = shape.number_of_elements().unwrap_or_default();
    if data.len() as u64 != expected_len {
        return Err(Error::ShapeMismatch {
            expected: format!("{expected_len} elements for {shape}"),
            actual: format!("{} elements", data.len()),
        });
    }

    let channels = CHANNELS as usize;
    let img = RgbImage::from_fn(width, height, |x, y| {
        let offset = (y as usize * width as usize + x as usize) * channels;
        let ordered = [
            denormalize(data[offset], scaling_factor),
            denormalize(data[offset + 1], scaling_factor),
            denormalize(data[offset + 2], scaling_factor),
        ];
        Rgb(color_order.reorder(ordered))
    });

    Ok(img)
}

/// Scale a tensor value back into the `[0, 255]` sample domain.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32, scaling_factor: f32) -> u8 {
    (value * scaling_factor).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::*;

    #[test]
    fn test_denormalize() {
        assert_eq!(denormalize(0.0, 255.0), 0);
        assert_eq!(denormalize(1.0, 255.0), 255);
        assert_eq!(denormalize(128.0 / 255.0, 255.0), 128);
    }

    #[test]
    fn test_denormalize_clamp() {
        assert_eq!(denormalize(-2.0, 255.0), 0);
        assert_eq!(denormalize(2.0, 255.0), 255);
    }

    #[test]
    fn test_tensor_to_image_bgr() {
        // one pixel, stored blue-first
        let data = [1.0, 0.0, 0.0];
        let img = tensor_to_image(&data, &ImageShape::new(1, 1, 3), ColorOrder::Bgr, 255.0).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_tensor_to_image_length_mismatch() {
        let err = tensor_to_image(&[0.0; 5], &ImageShape::new(1, 2, 3), ColorOrder::Rgb, 255.0)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_tensor_to_image_unresolved_shape() {
        let err = tensor_to_image(&[], &ImageShape::unresolved(3), ColorOrder::Rgb, 255.0)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_save_image_writes_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 8, 7])));
        let buffer = PixelBuffer::from_image(&img, ColorOrder::Bgr).unwrap();

        save_image(&buffer, &path).unwrap();

        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded.get_pixel(1, 1).0, [9, 8, 7]);
    }
}
