//! Blur orchestration.
//!
//! Turns a target into a plan and drives it through a graphics engine.
//!
//! ## Plan
//!
//! For each level in declaration order, one blur step per source file
//! (in file-group order) followed by a report step for that level:
//!
//! ```text
//! Blur(low, panther.jpg) → Blur(low, owl.gif) → Report(low)
//! Blur(high, panther.jpg) → Blur(high, owl.gif) → Report(high)
//! ```
//!
//! ## Job States
//!
//! ```text
//! PENDING ─┬─ destination exists && skip_existing ──→ AlreadyExists
//!          └─ PROCESSING: create dir, probe
//!               ├─ animated && !allow_animated ──────→ Animated
//!               ├─ blur + quality + write ───────────→ Blurred (tally + 1)
//!               └─ probe/write error ────────────────→ run aborts
//! ```
//!
//! Steps run strictly one after another. The first engine error stops the
//! run; outputs already written stay on disk.

use crate::config::{ConfigError, TargetConfig, TaskConfig};
use crate::files::{SourceFile, expand_groups};
use crate::imaging::{BackendError, BlurParams, EngineKind, GraphicsEngine, backend_for};
use crate::levels::{Level, prepare_levels};
use crate::naming::{self, TemplateError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Unable to blur {}: {}", .path.display(), .source)]
    Imaging { path: PathBuf, source: BackendError },
}

/// One (source file × level) unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct FileJob<'a> {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub level: &'a Level,
}

/// One entry of the run plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<'a> {
    Blur(FileJob<'a>),
    Report(&'a Level),
}

/// Terminal state of a job that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Blurred,
    AlreadyExists,
    Animated,
}

/// Progress events sent while a plan runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    JobFinished {
        level: String,
        source: PathBuf,
        destination: PathBuf,
        outcome: JobOutcome,
    },
    /// All jobs of a level are done. Sent even when nothing was blurred.
    LevelFinished { level: String, count: usize },
}

/// Per-level counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTally {
    pub id: usize,
    pub name: String,
    pub blurred: usize,
    pub already_existed: usize,
    pub animated: usize,
}

/// Level id → counts, filled as jobs finish.
#[derive(Debug, Default)]
pub struct Tally {
    levels: BTreeMap<usize, LevelTally>,
}

impl Tally {
    fn entry(&mut self, level: &Level) -> &mut LevelTally {
        self.levels.entry(level.id()).or_insert_with(|| LevelTally {
            id: level.id(),
            name: level.display_name.clone(),
            ..LevelTally::default()
        })
    }

    pub fn record(&mut self, level: &Level, outcome: JobOutcome) {
        let tally = self.entry(level);
        match outcome {
            JobOutcome::Blurred => tally.blurred += 1,
            JobOutcome::AlreadyExists => tally.already_existed += 1,
            JobOutcome::Animated => tally.animated += 1,
        }
    }

    /// Files blurred for a level so far.
    pub fn count(&self, id: usize) -> usize {
        self.levels.get(&id).map_or(0, |t| t.blurred)
    }
}

/// Outcome of running one target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    /// One entry per reported level, in declaration order.
    pub levels: Vec<LevelTally>,
}

impl ProcessResult {
    pub fn total_blurred(&self) -> usize {
        self.levels.iter().map(|l| l.blurred).sum()
    }
}

/// Everything needed to run a target, resolved and validated.
#[derive(Debug, Clone)]
pub struct TargetPlan {
    pub name: String,
    pub engine: EngineKind,
    pub levels: Vec<Level>,
    pub sources: Vec<SourceFile>,
    /// Directory that relative paths and rendered templates resolve against.
    pub base_dir: PathBuf,
}

impl TargetPlan {
    /// Build the ordered list of steps.
    ///
    /// Destinations are resolved here, so a template error surfaces before
    /// any file is written.
    pub fn steps(&self) -> Result<Vec<Step<'_>>, ProcessError> {
        if self.sources.is_empty() {
            for level in &self.levels {
                warn!(
                    level = %level.display_name,
                    "Unable to compile; no valid source files were found."
                );
            }
            return Ok(Vec::new());
        }

        let mut steps = Vec::with_capacity(self.levels.len() * (self.sources.len() + 1));
        for level in &self.levels {
            for file in &self.sources {
                steps.push(Step::Blur(FileJob {
                    source: file.source.clone(),
                    destination: destination_for(level, file, &self.base_dir)?,
                    level,
                }));
            }
            steps.push(Step::Report(level));
        }
        Ok(steps)
    }
}

/// Where `file` is written for `level`.
pub fn destination_for(
    level: &Level,
    file: &SourceFile,
    base_dir: &Path,
) -> Result<PathBuf, ProcessError> {
    if let Some(template) = &file.custom_dest {
        let path = naming::relative_dir(&file.relative);
        let dir = naming::render_template(template, |field| match field {
            "path" => Some(path.clone()),
            other => level.field(other),
        })?;
        return Ok(naming::template_destination(
            &base_dir.join(dir),
            &file.source,
        ));
    }
    match &file.dest {
        Some(dest) => Ok(naming::default_destination(dest, &level.output_name)),
        None => Err(ConfigError::MissingDestination {
            src: vec![file.source.display().to_string()],
        }
        .into()),
    }
}

/// Resolve a target's options, levels, engine and source files.
pub fn prepare_target(
    task: &TaskConfig,
    target: &TargetConfig,
    base_dir: &Path,
) -> Result<TargetPlan, ProcessError> {
    let options = task.options_for(target)?;
    let engine = options.engine_kind()?;
    let levels = prepare_levels(&options)?;
    let sources = expand_groups(&target.files, base_dir, &target.name)?;
    debug!(
        target_name = %target.name,
        "{} level(s), {} source file(s)",
        levels.len(),
        sources.len()
    );
    Ok(TargetPlan {
        name: target.name.clone(),
        engine,
        levels,
        sources,
        base_dir: base_dir.to_path_buf(),
    })
}

/// Run a target with the engine its options select.
pub fn run_target(
    task: &TaskConfig,
    target: &TargetConfig,
    base_dir: &Path,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let plan = prepare_target(task, target, base_dir)?;
    let backend = backend_for(plan.engine);
    info!(target_name = %plan.name, "Blurring with {}", plan.engine);
    run_plan(backend.as_ref(), &plan, events)
}

/// Run a prepared target with a specific engine (allows testing with mock).
pub fn run_plan(
    backend: &dyn GraphicsEngine,
    plan: &TargetPlan,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    execute(backend, plan.steps()?, events)
}

/// Drive the steps in order, stopping at the first error.
pub fn execute(
    backend: &dyn GraphicsEngine,
    steps: Vec<Step<'_>>,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let send = |event: ProcessEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    let mut tally = Tally::default();
    let mut result = ProcessResult::default();

    for step in steps {
        match step {
            Step::Blur(job) => {
                let outcome = run_job(backend, &job)?;
                tally.record(job.level, outcome);
                send(ProcessEvent::JobFinished {
                    level: job.level.display_name.clone(),
                    source: job.source,
                    destination: job.destination,
                    outcome,
                });
            }
            Step::Report(level) => {
                let counts = tally.entry(level).clone();
                send(ProcessEvent::LevelFinished {
                    level: level.display_name.clone(),
                    count: counts.blurred,
                });
                result.levels.push(counts);
            }
        }
    }
    Ok(result)
}

/// Take one job from PENDING to a terminal state.
fn run_job(backend: &dyn GraphicsEngine, job: &FileJob<'_>) -> Result<JobOutcome, ProcessError> {
    let options = &job.level.options;
    if options.skip_existing && job.destination.exists() {
        debug!("File already exists: {}", job.destination.display());
        return Ok(JobOutcome::AlreadyExists);
    }

    if let Some(dir) = job.destination.parent() {
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let imaging = |source: BackendError| ProcessError::Imaging {
        path: job.source.clone(),
        source,
    };

    let info = backend.probe(&job.source).map_err(imaging)?;
    if info.is_animated() && !options.allow_animated {
        debug!(
            "Skipping animated image {} ({} frames)",
            job.source.display(),
            info.frames
        );
        return Ok(JobOutcome::Animated);
    }

    let blur = job.level.blur();
    let params = BlurParams::new(&job.source, &job.destination)
        .blur(blur.radius, blur.sigma)
        .quality(job.level.quality());
    backend.write(&params).map_err(imaging)?;
    debug!(
        "Blurred {} → {} (radius {}, quality {})",
        job.source.display(),
        job.destination.display(),
        blur.radius,
        params.quality.value()
    );
    Ok(JobOutcome::Blurred)
}
