//! Shared test utilities for the blurred-images test suite.
//!
//! Synthetic image writers plus small builders for option fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("panther.jpg"), 64, 48);
//!
//! let options = options_with_levels(vec![
//!     blur_level(1.0, "low", 40),
//!     blur_level(3.0, "high", 80),
//! ]);
//! ```

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{Delay, Frame, ImageEncoder, RgbImage, RgbaImage};

use crate::config::{BlurLevel, GlobalOptions, LevelValue};
use crate::levels::{Level, prepare_levels};

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a gradient JPEG of the given size.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a GIF with `frames` solid-colour frames, 100 ms apart.
pub fn create_animated_gif(path: &Path, width: u32, height: u32, frames: u32) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GifEncoder::new(std::io::BufWriter::new(file));
    let frames = (0..frames).map(|i| {
        let shade = (i * 80 % 256) as u8;
        let img = RgbaImage::from_pixel(width, height, image::Rgba([shade, 255 - shade, 64, 255]));
        Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(100, 1))
    });
    encoder.encode_frames(frames).unwrap();
}

// =========================================================================
// Option fixtures
// =========================================================================

/// A named level with an explicit quality.
pub fn blur_level(level: impl Into<LevelValue>, name: &str, quality: i64) -> BlurLevel {
    BlurLevel {
        name: Some(name.to_string()),
        level: Some(level.into()),
        quality: Some(quality),
        ..BlurLevel::default()
    }
}

/// Default global options carrying the given levels.
pub fn options_with_levels(levels: Vec<BlurLevel>) -> GlobalOptions {
    GlobalOptions {
        levels: Some(levels),
        ..GlobalOptions::default()
    }
}

/// Resolve and validate levels, panicking on a config error.
pub fn levels_of(options: &GlobalOptions) -> Vec<Level> {
    prepare_levels(options).unwrap()
}

// =========================================================================
// Log capture
// =========================================================================

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return its WARN-and-above output.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (value, logs)
}
