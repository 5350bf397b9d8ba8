//! # Blurred Images
//!
//! Batch image blurring for asset builds. Given source images and a list of
//! blur levels, produces one blurred copy per (image, level) pair, each with
//! its own blur radius and encoding quality, placed by a naming or
//! destination-template scheme.
//!
//! # Pipeline
//!
//! A task file describes targets; each target runs through the same stages:
//!
//! ```text
//! 1. Options    stock → [options] → targets.options   (config)
//! 2. Levels     resolve ids, validate, derive names   (levels)
//! 3. Sources    expand file groups into source files  (files)
//! 4. Plan       level × file → destination paths      (naming, process)
//! 5. Execute    skip / probe / blur / write, tally     (process, imaging)
//! 6. Report     "3 files blurred for low"             (output)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Task file loading, option layering, file-group and level types |
//! | [`levels`] | Level resolution (ids, overrides) and validation |
//! | [`files`] | Glob expansion of file groups in expand and compact mode |
//! | [`naming`] | Display names, output names, destination templates |
//! | [`process`] | Run plan, per-job state machine, tallies and progress events |
//! | [`imaging`] | Graphics engines: pure Rust, GraphicsMagick, ImageMagick |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Engine Per Target
//!
//! The `engine` option picks a [`imaging::GraphicsEngine`] once per target.
//! Orchestration only talks to the trait, so the engine changes error
//! messages (install hints) and nothing else. The default `rust` engine needs
//! no system packages; `gm` and `im` drive the command-line tools.
//!
//! ## Bad Levels Skip, Bad Config Stops
//!
//! A malformed level (`"1.1.1%"`, quality `0`) is logged and skipped so the
//! other levels still run. Anything that makes the whole target meaningless
//! (no levels, a file group without sources, an unknown engine or template
//! field) stops the run before any file is written. An engine error while
//! blurring stops the run too; files already written stay.
//!
//! ## Idempotent Runs
//!
//! With `skip_existing` (the default) a job whose destination exists is not
//! probed or written, so re-running a build only fills in what is missing.

pub mod config;
pub mod files;
pub mod imaging;
pub mod levels;
pub mod naming;
pub mod output;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;
