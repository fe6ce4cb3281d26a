//! Pipeline composer: builds the fixed stage sequence and runs images through it.

use std::path::{Path, PathBuf};

use ::image::DynamicImage;

use crate::error::{Error, Result};
use crate::image::{
    decode_image, load_image, save_image, ColorOrder, ImageShape, PixelBuffer, CHANNELS,
};

use super::config::{
    defaults, ImageTransform, Interpolation, LoadConfig, PreprocessingConfig, TensorTransform,
};
use super::crop::{self, crop};
use super::resize::resize;
use super::rotate::{quarter_turns, rotate};
use super::tensor;

/// Label used when an image has no usable id.
const DEFAULT_ID: &str = "image";

/// An immutable, validated preprocessing pipeline.
///
/// Stages run in declared order: load, then every image transform, then
/// every tensor transform, each exactly once. The pipeline holds no mutable
/// state, so one instance can serve many threads.
#[derive(Debug, Clone)]
pub struct Preprocessing {
    config: PreprocessingConfig,
}

impl Preprocessing {
    /// Create a pipeline from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage parameter is invalid.
    pub fn new(config: PreprocessingConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            "Initialized preprocessing: load {:?}, {} image transforms, {} tensor transforms",
            config.load.color_order,
            config.image_transforms.len(),
            config.tensor_transforms.len()
        );

        Ok(Self { config })
    }

    /// Start building a pipeline stage by stage.
    #[must_use]
    pub fn builder() -> PreprocessingBuilder {
        PreprocessingBuilder::default()
    }

    /// Create a pipeline from a JSON configuration string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(PreprocessingConfig::from_json_str(json)?)
    }

    /// Create a pipeline from a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub const fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Run a decoded image through every stage.
    ///
    /// `id` only labels log lines and files written by save stages.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails; no partial result is produced.
    pub fn handle_image(&self, image: &DynamicImage, id: &str) -> Result<(Vec<f32>, ImageShape)> {
        let buffer = PixelBuffer::from_image(image, self.config.load.color_order)?;
        self.run(buffer, id)
    }

    /// Decode encoded image bytes and run them through every stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the bytes are not an image, or any stage error.
    pub fn handle_bytes(&self, bytes: &[u8], id: &str) -> Result<(Vec<f32>, ImageShape)> {
        let buffer = decode_image(bytes, self.config.load.color_order)?;
        self.run(buffer, id)
    }

    /// Load an image file and run it through every stage, labelled by its file stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or any stage fails.
    pub fn handle_file<P: AsRef<Path>>(&self, path: P) -> Result<(Vec<f32>, ImageShape)> {
        let path = path.as_ref();
        let buffer = load_image(path, self.config.load.color_order)?;
        let id = path
            .file_stem()
            .map_or_else(|| DEFAULT_ID.into(), |stem| stem.to_string_lossy());
        self.run(buffer, &id)
    }

    /// Shape produced for an input of shape `input`, without touching pixels.
    ///
    /// Unset input dimensions stay unset until a resize fixes them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a crop would leave no pixels of a
    /// known dimension.
    pub fn output_shape(&self, input: ImageShape) -> Result<ImageShape> {
        let mut shape = ImageShape {
            channels: CHANNELS,
            ..input
        };

        for transform in &self.config.image_transforms {
            match transform {
                ImageTransform::Resize {
                    output_width,
                    output_height,
                    ..
                } => {
                    shape.width = Some(*output_width);
                    shape.height = Some(*output_height);
                }
                ImageTransform::Crop {
                    left,
                    right,
                    top,
                    bottom,
                } => {
                    shape.width = shape
                        .width
                        .map(|w| crop::remaining(w, *left, *right, "width"))
                        .transpose()?;
                    shape.height = shape
                        .height
                        .map(|h| crop::remaining(h, *top, *bottom, "height"))
                        .transpose()?;
                }
                ImageTransform::Rotate { degrees, .. } => {
                    if matches!(quarter_turns(*degrees), Some(1 | 3)) {
                        std::mem::swap(&mut shape.width, &mut shape.height);
                    }
                }
                ImageTransform::Save { .. } => {}
            }
        }

        Ok(shape)
    }

    fn run(&self, buffer: PixelBuffer, id: &str) -> Result<(Vec<f32>, ImageShape)> {
        tracing::debug!("[{id}] loaded {}", buffer.shape());

        let buffer = self
            .config
            .image_transforms
            .iter()
            .try_fold(buffer, |buffer, transform| {
                let next = apply_image_transform(&buffer, transform, id)?;
                tracing::debug!("[{id}] {} -> {}", transform.name(), next.shape());
                Ok::<_, Error>(next)
            })?;

        let shape = buffer.shape();
        let mut data = tensor::to_tensor(&buffer);
        for transform in &self.config.tensor_transforms {
            tensor::apply(&mut data, transform);
            tracing::debug!("[{id}] {}", transform.name());
        }

        Ok((tensor::into_flat(data), shape))
    }
}

fn apply_image_transform(
    buffer: &PixelBuffer,
    transform: &ImageTransform,
    id: &str,
) -> Result<PixelBuffer> {
    match transform {
        ImageTransform::Resize {
            output_width,
            output_height,
            interpolation,
        } => resize(buffer, *output_width, *output_height, *interpolation),
        ImageTransform::Crop {
            left,
            right,
            top,
            bottom,
        } => crop(buffer, *left, *right, *top, *bottom),
        ImageTransform::Rotate {
            degrees,
            interpolation,
        } => rotate(buffer, *degrees, *interpolation),
        ImageTransform::Save { dir } => {
            save_snapshot(buffer, dir, id)?;
            Ok(buffer.clone())
        }
    }
}

/// Write `buffer` to `<dir>/<id>.png`, creating `dir` if needed.
fn save_snapshot(buffer: &PixelBuffer, dir: &Path, id: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let id = if id.is_empty() { DEFAULT_ID } else { id };
    let file_name: String = id
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect();
    let path = dir.join(format!("{file_name}.png"));
    tracing::debug!("[{id}] saving snapshot to {}", path.display());
    save_image(buffer, path)
}

/// Stage-by-stage builder for [`Preprocessing`].
///
/// ```
/// use imgprep::{ColorOrder, Interpolation, Preprocessing};
///
/// # fn main() -> imgprep::Result<()> {
/// let preprocessing = Preprocessing::builder()
///     .load(ColorOrder::Bgr)
///     .resize(224, 224, Interpolation::Nearest)
///     .rescale_default()
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PreprocessingBuilder {
    config: PreprocessingConfig,
}

impl PreprocessingBuilder {
    /// Set the channel order samples are loaded in.
    #[must_use]
    pub fn load(mut self, color_order: ColorOrder) -> Self {
        self.config.load = LoadConfig { color_order };
        self
    }

    /// Append an image transform.
    #[must_use]
    pub fn image_transform(mut self, transform: ImageTransform) -> Self {
        self.config.image_transforms.push(transform);
        self
    }

    /// Append a tensor transform.
    #[must_use]
    pub fn tensor_transform(mut self, transform: TensorTransform) -> Self {
        self.config.tensor_transforms.push(transform);
        self
    }

    #[must_use]
    pub fn resize(self, output_width: u32, output_height: u32, interpolation: Interpolation) -> Self {
        self.image_transform(ImageTransform::Resize {
            output_width,
            output_height,
            interpolation,
        })
    }

    #[must_use]
    pub fn crop(self, left: u32, right: u32, top: u32, bottom: u32) -> Self {
        self.image_transform(ImageTransform::Crop {
            left,
            right,
            top,
            bottom,
        })
    }

    /// Rotate clockwise with the default interpolation.
    #[must_use]
    pub fn rotate(self, degrees: f32) -> Self {
        self.rotate_with(degrees, defaults::INTERPOLATION)
    }

    #[must_use]
    pub fn rotate_with(self, degrees: f32, interpolation: Interpolation) -> Self {
        self.image_transform(ImageTransform::Rotate {
            degrees,
            interpolation,
        })
    }

    /// Snapshot the buffer at this point to `<dir>/<id>.png`.
    #[must_use]
    pub fn save<P: Into<PathBuf>>(self, dir: P) -> Self {
        self.image_transform(ImageTransform::Save { dir: dir.into() })
    }

    #[must_use]
    pub fn rescale(self, scaling_factor: f32) -> Self {
        self.tensor_transform(TensorTransform::Rescale { scaling_factor })
    }

    /// Rescale by [`defaults::RESCALE_FACTOR`].
    #[must_use]
    pub fn rescale_default(self) -> Self {
        self.rescale(defaults::RESCALE_FACTOR)
    }

    #[must_use]
    pub fn normalize(self, mean: [f32; 3], std: [f32; 3]) -> Self {
        self.tensor_transform(TensorTransform::Normalize { mean, std })
    }

    /// Validate and freeze the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage parameter is invalid.
    pub fn build(self) -> Result<Preprocessing> {
        Preprocessing::new(self.config)
    }
}
