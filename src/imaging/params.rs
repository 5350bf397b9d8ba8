//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [orchestrator](crate::process) (which decides what
//! images to create) and the [`backend`](super::backend) (which does the
//! actual pixel work). This separation allows swapping engines (e.g. for
//! testing with a mock) without changing orchestration logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 100). Clamped on construction.
//! - [`Blur`]: Gaussian blur kernel parameters (radius + sigma).
//! - [`BlurParams`]: Full specification for one output: source, output path, blur, quality.
//!
//! [`BlurParams`] is assembled the way a graphics engine command is: start
//! from the source and destination, then chain `blur` and `quality`.
//!
//! ```
//! use blurred_images::imaging::BlurParams;
//!
//! let params = BlurParams::new("in/panther.jpg", "out/panther-low.jpg")
//!     .blur(3.0, 1.0)
//!     .quality(40);
//! assert_eq!(params.quality.value(), 40);
//! ```

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Gaussian blur parameters.
///
/// - `radius`: kernel radius in pixels (the level value)
/// - `sigma`: standard deviation of the Gaussian
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blur {
    pub radius: f64,
    pub sigma: f64,
}

impl Blur {
    /// Blur derived from a level value: sigma is a third of the radius.
    pub fn from_radius(radius: f64) -> Self {
        Self {
            radius,
            sigma: radius / 3.0,
        }
    }

    /// Whether the kernel would leave the image unchanged.
    pub fn is_noop(&self) -> bool {
        self.radius <= 0.0 || self.sigma <= 0.0
    }

    /// Sigma capped at the larger side of a `width`×`height` image.
    ///
    /// A Gaussian wider than the image already averages it fully, while the
    /// kernel cost keeps growing with sigma.
    pub fn sigma_within(&self, width: u32, height: u32) -> f64 {
        self.sigma.min(f64::from(width.max(height).max(1)))
    }
}

/// Parameters for a single blur-and-write operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` writes the image without blurring it.
    pub blur: Option<Blur>,
    pub quality: Quality,
}

impl BlurParams {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            blur: None,
            quality: Quality::default(),
        }
    }

    pub fn blur(mut self, radius: f64, sigma: f64) -> Self {
        self.blur = Some(Blur { radius, sigma });
        self
    }

    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = Quality::new(quality);
        self
    }
}
