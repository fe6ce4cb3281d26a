//! Tensor conversion and numeric stages.

use ndarray::{Array3, Axis};

use crate::image::{PixelBuffer, CHANNELS};

use super::config::TensorTransform;

/// Image tensor in HWC layout (height, width, channels), standard row-major
/// order. Channels follow the buffer's color order.
pub type ImageTensor = Array3<f32>;

/// Convert pixel samples into a float tensor holding the raw `[0, 255]` values.
#[must_use]
pub fn to_tensor(buffer: &PixelBuffer) -> ImageTensor {
    let samples = buffer.samples();
    let shape = (
        buffer.height() as usize,
        buffer.width() as usize,
        CHANNELS as usize,
    );

    ImageTensor::from_shape_fn(shape, |(y, x, c)| {
        // Safe: y < height and x < width, both of which fit in u32
        #[allow(clippy::cast_possible_truncation)]
        let pixel = samples.get_pixel(x as u32, y as u32);
        f32::from(pixel[c])
    })
}

/// Apply one numeric stage in place.
pub fn apply(tensor: &mut ImageTensor, transform: &TensorTransform) {
    match transform {
        TensorTransform::Rescale { scaling_factor } => {
            let factor = *scaling_factor;
            tensor.mapv_inplace(|v| v / factor);
        }
        TensorTransform::Normalize { mean, std } => {
            for (c, mut channel) in tensor.axis_iter_mut(Axis(2)).enumerate() {
                let (m, s) = (mean[c], std[c]);
                channel.mapv_inplace(|v| (v - m) / s);
            }
        }
    }
}

/// Flatten a tensor into row-major `(y, x, c)` order.
#[must_use]
pub fn into_flat(tensor: ImageTensor) -> Vec<f32> {
    // logical iteration order is row-major regardless of memory layout
    tensor.iter().copied().collect()
}
