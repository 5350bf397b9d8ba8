//! GraphicsMagick and ImageMagick engines.
//!
//! Both drive the engine's command-line tools, one process per operation:
//!
//! | Operation | GraphicsMagick | ImageMagick |
//! |---|---|---|
//! | Probe | `gm identify -format …` | `identify -format …` |
//! | Blur + quality + write | `gm convert SRC -blur RxS -quality Q DST` | `convert SRC -blur RxS -quality Q DST` |
//!
//! `identify` prints one line per scene, so a multi-frame file yields
//! several lines; the first line's delay (in centiseconds) is the frame delay.
//!
//! A program that cannot be spawned becomes
//! [`BackendError::MissingDependency`], whose message tells the user how to
//! install the engine or which alternative to switch to.

use super::backend::{BackendError, GraphicsEngine, ImageInfo};
use super::engine::EngineKind;
use super::params::BlurParams;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output};

/// `identify` format string: format, width, height, delay, scene.
const IDENTIFY_FORMAT: &str = "%m %w %h %T %s\n";

/// How to invoke one engine's tools.
struct Magick {
    engine: EngineKind,
    /// Program plus leading sub-command, e.g. `gm identify`.
    identify: (&'static str, Option<&'static str>),
    convert: (&'static str, Option<&'static str>),
}

impl Magick {
    fn command(&self, (program, sub): (&'static str, Option<&'static str>)) -> Command {
        let mut cmd = Command::new(program);
        if let Some(sub) = sub {
            cmd.arg(sub);
        }
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<Output, BackendError> {
        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::MissingDependency {
                    engine: self.engine,
                    source: e,
                }
            } else {
                BackendError::Io(e)
            }
        })?;
        if !output.status.success() {
            return Err(BackendError::ProcessingFailed(format!(
                "{} failed: {}",
                self.engine,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }

    fn probe(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let mut cmd = self.command(self.identify);
        cmd.arg("-format").arg(IDENTIFY_FORMAT).arg(path);
        let output = self.run(cmd)?;
        parse_identify(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "Unexpected identify output for {}",
                path.display()
            ))
        })
    }

    fn write(&self, params: &BlurParams) -> Result<(), BackendError> {
        let mut cmd = self.command(self.convert);
        cmd.args(convert_args(params));
        self.run(cmd).map(|_| ())
    }
}

/// Parse `identify` output produced with [`IDENTIFY_FORMAT`].
fn parse_identify(stdout: &str) -> Option<ImageInfo> {
    let mut lines = stdout.lines().filter(|l| !l.trim().is_empty());
    let first = lines.next()?;
    let mut fields = first.split_whitespace();
    let format = fields.next()?;
    let width = fields.next()?.parse().ok()?;
    let height = fields.next()?.parse().ok()?;
    let centiseconds: u32 = fields.next().and_then(|d| d.parse().ok()).unwrap_or(0);

    let mut info = ImageInfo::still(format, width, height);
    info.frames = 1 + lines.count() as u32;
    info.delay = centiseconds.saturating_mul(10);
    Some(info)
}

/// Arguments after the `convert` program/sub-command.
fn convert_args(params: &BlurParams) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![params.source.clone().into()];
    if let Some(blur) = params.blur {
        args.push("-blur".into());
        args.push(format!("{}x{}", blur.radius, blur.sigma).into());
    }
    args.push("-quality".into());
    args.push(params.quality.value().to_string().into());
    args.push(params.output.clone().into());
    args
}

/// GraphicsMagick engine (`gm identify`, `gm convert`).
pub struct GraphicsMagickBackend {
    magick: Magick,
}

impl GraphicsMagickBackend {
    pub fn new() -> Self {
        Self {
            magick: Magick {
                engine: EngineKind::GraphicsMagick,
                identify: ("gm", Some("identify")),
                convert: ("gm", Some("convert")),
            },
        }
    }
}

impl Default for GraphicsMagickBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsEngine for GraphicsMagickBackend {
    fn kind(&self) -> EngineKind {
        self.magick.engine
    }

    fn probe(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        self.magick.probe(path)
    }

    fn write(&self, params: &BlurParams) -> Result<(), BackendError> {
        self.magick.write(params)
    }
}

/// ImageMagick engine (`identify`, `convert`).
pub struct ImageMagickBackend {
    magick: Magick,
}

impl ImageMagickBackend {
    pub fn new() -> Self {
        Self {
            magick: Magick {
                engine: EngineKind::ImageMagick,
                identify: ("identify", None),
                convert: ("convert", None),
            },
        }
    }
}

impl Default for ImageMagickBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsEngine for ImageMagickBackend {
    fn kind(&self) -> EngineKind {
        self.magick.engine
    }

    fn probe(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        self.magick.probe(path)
    }

    fn write(&self, params: &BlurParams) -> Result<(), BackendError> {
        self.magick.write(params)
    }
}
