//! Graphics engine registry.
//!
//! Each target selects exactly one engine through its `engine` option. The
//! engine only changes *who* does the pixel work and what an error message
//! tells the user to install; orchestration is identical for all of them.
//!
//! | Code | Engine | Install |
//! |---|---|---|
//! | `rust` | pure-Rust `image` crate | built in |
//! | `gm` | GraphicsMagick | `brew install graphicsmagick` |
//! | `im` | ImageMagick | `brew install imagemagick` |

use super::backend::GraphicsEngine;
use super::magick::{GraphicsMagickBackend, ImageMagickBackend};
use super::rust_backend::RustBackend;
use std::fmt;
use std::str::FromStr;

/// Identifier of a graphics engine, as written in the `engine` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Rust,
    GraphicsMagick,
    ImageMagick,
}

/// Human-facing details used in log lines and remediation hints.
#[derive(Debug, Clone, Copy)]
pub struct EngineInfo {
    pub name: &'static str,
    /// Homebrew formula, when the engine is an external program.
    pub brew_formula: Option<&'static str>,
    pub url: &'static str,
    pub alternative: EngineKind,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [
        EngineKind::Rust,
        EngineKind::GraphicsMagick,
        EngineKind::ImageMagick,
    ];

    pub fn code(self) -> &'static str {
        match self {
            EngineKind::Rust => "rust",
            EngineKind::GraphicsMagick => "gm",
            EngineKind::ImageMagick => "im",
        }
    }

    pub fn info(self) -> EngineInfo {
        match self {
            EngineKind::Rust => EngineInfo {
                name: "Rust image",
                brew_formula: None,
                url: "https://docs.rs/image",
                alternative: EngineKind::GraphicsMagick,
            },
            EngineKind::GraphicsMagick => EngineInfo {
                name: "GraphicsMagick",
                brew_formula: Some("graphicsmagick"),
                url: "http://www.graphicsmagick.org/download.html",
                alternative: EngineKind::ImageMagick,
            },
            EngineKind::ImageMagick => EngineInfo {
                name: "ImageMagick",
                brew_formula: Some("imagemagick"),
                url: "http://www.imagemagick.org/script/binary-releases.php",
                alternative: EngineKind::GraphicsMagick,
            },
        }
    }

    /// Multi-line hint shown when the engine's program cannot be found.
    pub fn install_hint(self) -> String {
        let info = self.info();
        let alt = info.alternative;
        let install = match info.brew_formula {
            Some(formula) => format!("`brew install {formula}` or see {}", info.url),
            None => format!("see {}", info.url),
        };
        format!(
            "Please ensure {} is installed correctly.\n{install} for more details.\n\
             Alternatively, set options.engine to '{}' to use {}.",
            info.name,
            alt.code(),
            alt.info().name,
        )
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Error for an `engine` value that names no known engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEngine(pub String);

impl fmt::Display for UnknownEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = EngineKind::ALL.iter().map(|k| k.code()).collect();
        write!(
            f,
            "Invalid render engine specified: '{}' (expected one of: {})",
            self.0,
            codes.join(", ")
        )
    }
}

impl std::error::Error for UnknownEngine {}

impl FromStr for EngineKind {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.code() == s.trim())
            .ok_or_else(|| UnknownEngine(s.to_string()))
    }
}

/// Construct the backend for an engine.
pub fn backend_for(kind: EngineKind) -> Box<dyn GraphicsEngine> {
    match kind {
        EngineKind::Rust => Box::new(RustBackend::new()),
        EngineKind::GraphicsMagick => Box::new(GraphicsMagickBackend::new()),
        EngineKind::ImageMagick => Box::new(ImageMagickBackend::new()),
    }
}
