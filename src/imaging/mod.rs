//! Graphics engines: the adapter between the orchestrator and whatever does
//! the pixel work.
//!
//! | Operation | Rust engine | GraphicsMagick / ImageMagick |
//! |---|---|---|
//! | **Probe** | `image::ImageReader` + GIF frame count | `identify -format` |
//! | **Blur** | `DynamicImage::blur` | `-blur RxS` |
//! | **Quality** | JPEG encoder quality | `-quality Q` |
//! | **Write** | `image` encoders | `convert … DST` |
//!
//! The module is split into:
//! - **Parameters**: [`BlurParams`], [`Blur`], [`Quality`]
//! - **Backend**: [`GraphicsEngine`] trait, [`ImageInfo`], [`BackendError`]
//! - **Engine**: [`EngineKind`] registry and [`backend_for`]
//! - **Implementations**: [`RustBackend`], [`GraphicsMagickBackend`], [`ImageMagickBackend`]

pub mod backend;
pub mod engine;
pub mod magick;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, GraphicsEngine, ImageInfo};
pub use engine::{EngineKind, UnknownEngine, backend_for};
pub use magick::{GraphicsMagickBackend, ImageMagickBackend};
pub use params::{Blur, BlurParams, Quality};
pub use rust_backend::RustBackend;
