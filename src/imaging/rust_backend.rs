//! Pure Rust graphics engine. No external programs required.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Probe format + dimensions | `image::ImageReader::with_guessed_format` + `into_dimensions` |
//! | Animation markers (GIF) | `image::codecs::gif::GifDecoder` frame count + first-frame delay |
//! | Decode | `image` crate (JPEG, PNG, GIF, TIFF, WebP) |
//! | Blur | `image::DynamicImage::blur` (Gaussian, sigma only) |
//! | Blur GIF animation | `GifDecoder::into_frames`, per-frame blur, `GifEncoder::encode_frames` |
//! | Encode JPEG with quality | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode other formats | `DynamicImage::save_with_format` (quality does not apply) |
//!
//! The `image` crate derives the kernel size from sigma, so the radius of a
//! [`Blur`](super::params::Blur) is only used to decide whether to blur at all.
//! Sigma is capped at the image's larger side before blurring.
//!
//! A GIF written to a `.gif` destination keeps every frame with its offset
//! and delay. The decoder does not expose the source's loop count, so the
//! output loops forever. Any other destination gets the first frame only.

use super::backend::{BackendError, GraphicsEngine, ImageInfo};
use super::engine::EngineKind;
use super::params::{Blur, BlurParams};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::{AnimationDecoder, DynamicImage, Frame, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Pure Rust engine using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper-case name for a format (`Jpeg` → `JPEG`).
fn format_name(format: ImageFormat) -> String {
    format!("{format:?}").to_uppercase()
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Count GIF frames and read the first frame's delay in milliseconds.
fn gif_markers(path: &Path) -> Result<(u32, u32), BackendError> {
    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to read GIF {}: {}", path.display(), e))
    })?;

    let mut frames = 0;
    let mut delay = 0;
    for frame in decoder.into_frames() {
        let frame = frame.map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to decode GIF frame in {}: {}",
                path.display(),
                e
            ))
        })?;
        if frames == 0 {
            let (numer, denom) = frame.delay().numer_denom_ms();
            delay = numer.checked_div(denom).unwrap_or(0);
        }
        frames += 1;
    }
    Ok((frames, delay))
}

/// Apply `blur` unless it is absent or a no-op.
fn blur_image(img: DynamicImage, blur: Option<Blur>) -> DynamicImage {
    match blur {
        Some(blur) if !blur.is_noop() => {
            let sigma = blur.sigma_within(img.width(), img.height());
            img.blur(sigma as f32)
        }
        _ => img,
    }
}

/// Blur every frame of a GIF and re-encode it, keeping offsets and delays.
fn write_gif_frames(params: &BlurParams) -> Result<(), BackendError> {
    let source = &params.source;
    let decoder = GifDecoder::new(BufReader::new(File::open(source)?)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to read GIF {}: {}", source.display(), e))
    })?;
    let frames = decoder.into_frames().collect_frames().map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to decode GIF frames in {}: {}",
            source.display(),
            e
        ))
    })?;

    let blurred = frames.into_iter().map(|frame| {
        let (left, top, delay) = (frame.left(), frame.top(), frame.delay());
        let img = blur_image(DynamicImage::ImageRgba8(frame.into_buffer()), params.blur);
        Frame::from_parts(img.into_rgba8(), left, top, delay)
    });

    let output = &params.output;
    let encode_failed = |e: image::ImageError| {
        BackendError::ProcessingFailed(format!("GIF encode failed for {}: {}", output.display(), e))
    };
    let mut encoder = GifEncoder::new(BufWriter::new(File::create(output)?));
    encoder.set_repeat(Repeat::Infinite).map_err(encode_failed)?;
    encoder.encode_frames(blurred).map_err(encode_failed)
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format for {}: {}",
            path.display(),
            e
        ))
    })?;

    match format {
        ImageFormat::Jpeg => save_jpeg(img, path, quality),
        other if other.writing_enabled() => img.save_with_format(path, other).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to write {}: {}", path.display(), e))
        }),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            format_name(other)
        ))),
    }
}

/// JPEG has no alpha channel, so the image is flattened to RGB first.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

impl GraphicsEngine for RustBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Rust
    }

    fn probe(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Unrecognized image format: {}", path.display()))
        })?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;

        let mut info = ImageInfo::still(&format_name(format), width, height);
        if format == ImageFormat::Gif {
            let (frames, delay) = gif_markers(path)?;
            info.frames = frames;
            info.delay = delay;
        }
        Ok(info)
    }

    fn write(&self, params: &BlurParams) -> Result<(), BackendError> {
        let source_format = ImageReader::open(&params.source)?
            .with_guessed_format()?
            .format();
        let output_format = ImageFormat::from_path(&params.output).ok();
        if source_format == Some(ImageFormat::Gif) && output_format == Some(ImageFormat::Gif) {
            return write_gif_frames(params);
        }

        let img = load_image(&params.source)?;
        let blurred = blur_image(img, params.blur);
        save_image(&blurred, &params.output, params.quality.value())
    }
}
