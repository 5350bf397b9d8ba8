//! Graphics engine trait and shared types.
//!
//! The [`GraphicsEngine`] trait defines the operations every engine must
//! support: probe a source for its metadata, then blur, set quality and
//! write a destination (expressed as one [`BlurParams`] so a command-line
//! engine can run it as a single invocation).
//!
//! Implementations live in [`rust_backend`](super::rust_backend) (pure Rust,
//! the default) and [`magick`](super::magick) (GraphicsMagick / ImageMagick
//! command-line tools). Which one runs is chosen per target through
//! [`backend_for`](super::engine::backend_for).

use super::engine::EngineKind;
use super::params::BlurParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{} is not available ({})\n{}", .engine, .source, .engine.install_hint())]
    MissingDependency {
        engine: EngineKind,
        source: std::io::Error,
    },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of a probe operation.
///
/// `frames` is the number of scenes the engine reported and `delay` the
/// frame delay of the first scene in milliseconds (0 for stills).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Upper-case format name, e.g. `JPEG`, `GIF`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub delay: u32,
}

impl ImageInfo {
    /// A single-frame image.
    pub fn still(format: &str, width: u32, height: u32) -> Self {
        Self {
            format: format.to_uppercase(),
            width,
            height,
            frames: 1,
            delay: 0,
        }
    }

    /// Both animation markers are present: more than one scene and a
    /// non-zero frame delay.
    pub fn is_animated(&self) -> bool {
        self.frames > 1 && self.delay > 0
    }
}

/// Trait for graphics engines.
///
/// Every engine implements probe and write, so the orchestrator is
/// engine-agnostic. `kind` only feeds log lines and error messages.
pub trait GraphicsEngine {
    fn kind(&self) -> EngineKind;

    /// Read format, dimensions and animation markers of a source image.
    fn probe(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    /// Load `params.source`, apply blur and quality, write `params.output`.
    fn write(&self, params: &BlurParams) -> Result<(), BackendError>;
}
