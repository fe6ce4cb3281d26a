//! `imgprep` CLI - run images through a preprocessing pipeline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgprep::image::tensor_to_image;
use imgprep::{ColorOrder, Preprocessing, TensorTransform};

/// Run images through a declarative preprocessing pipeline and report the resulting tensors.
#[derive(Parser, Debug)]
#[command(name = "imgprep")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image files or directories.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// JSON pipeline configuration. Defaults to load + rescale.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Channel order used when no configuration file is given.
    #[arg(long, value_enum, default_value_t = ColorOrder::Rgb)]
    color_order: ColorOrder,

    /// Rebuild each tensor into an image and write it here as PNG.
    #[arg(short, long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("imgprep={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            tracing::error!("{failed} image(s) failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Process every input, returning the number of images that failed.
fn run(args: &Args) -> Result<usize> {
    let preprocessing = match &args.config {
        Some(path) => Preprocessing::from_json_file(path)
            .with_context(|| format!("Failed to load pipeline from {}", path.display()))?,
        None => Preprocessing::builder()
            .load(args.color_order)
            .rescale_default()
            .build()
            .context("Failed to build default pipeline")?,
    };

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No images found in the given inputs");
    }

    if let Some(dir) = &args.save_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} Preprocessing [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let mut failed = 0;
    for file in &files {
        if let Err(err) = process_file(&preprocessing, file, args.save_dir.as_deref(), &pb) {
            pb.suspend(|| tracing::error!("{}: {err:#}", file.display()));
            failed += 1;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    tracing::info!("Processed {} image(s)", files.len() - failed);

    Ok(failed)
}

fn process_file(
    preprocessing: &Preprocessing,
    file: &Path,
    save_dir: Option<&Path>,
    pb: &ProgressBar,
) -> Result<()> {
    let (data, shape) = preprocessing.handle_file(file)?;

    let min = data.iter().copied().fold(f32::INFINITY, f32::min);
    let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    pb.println(format!(
        "{}: shape {shape}, {} values in [{min}, {max}]",
        file.display(),
        data.len()
    ));

    let Some(dir) = save_dir else {
        return Ok(());
    };

    let config = preprocessing.config();
    let Some(scaling_factor) = inverse_scale(&config.tensor_transforms) else {
        tracing::warn!(
            "{}: normalized tensors cannot be rebuilt into an image, skipping save",
            file.display()
        );
        return Ok(());
    };

    let img = tensor_to_image(&data, &shape, config.load.color_order, scaling_factor)?;
    let stem = file.file_stem().unwrap_or_default().to_string_lossy();
    let out = dir.join(format!("{stem}.png"));
    img.save(&out)
        .with_context(|| format!("Failed to save {}", out.display()))?;
    tracing::debug!("Saved {}", out.display());

    Ok(())
}

/// Combined factor undoing a chain of rescales, or `None` if other stages are present.
fn inverse_scale(transforms: &[TensorTransform]) -> Option<f32> {
    transforms.iter().try_fold(1.0, |factor, transform| match transform {
        TensorTransform::Rescale { scaling_factor } => Some(factor * scaling_factor),
        TensorTransform::Normalize { .. } => None,
    })
}

/// Expand directories (non-recursively) into the image files they contain.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            anyhow::bail!("Input does not exist: {}", input.display());
        }

        if input.is_dir() {
            let mut entries = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?;
            entries.retain(|path| path.is_file() && image::ImageFormat::from_path(path).is_ok());
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}
