//! Preprocessing pipeline: configuration, stages and the composer that runs them.

mod config;
mod crop;
mod preprocessing;
mod resize;
mod rotate;
mod tensor;

pub use config::{
    defaults, ImageTransform, Interpolation, LoadConfig, PreprocessingConfig, TensorTransform,
};
pub use crop::crop;
pub use preprocessing::{Preprocessing, PreprocessingBuilder};
pub use resize::resize;
pub use rotate::rotate;
pub use tensor::{apply as apply_tensor_transform, into_flat, to_tensor, ImageTensor};
