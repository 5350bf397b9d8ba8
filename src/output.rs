//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns display lines; the
//! `print_*` wrappers write them to stdout. Warnings and diagnostics go
//! through `tracing` instead and never appear here.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! ==> Target: thumbnails
//! 3 files blurred for low
//! 1 file blurred for high
//! ```
//!
//! With `--verbose`, each job is listed as it finishes:
//!
//! ```text
//!     low: panther.jpg → out/panther-low.jpg
//!     low: owl.gif (animated, skipped)
//! ```
//!
//! ## Check
//!
//! ```text
//! thumbnails (engine: Rust image, 2 files)
//!     0 low (level 1, quality 40)
//!         assets/panther.jpg → out/panther-low.jpg
//! ```

use crate::process::{JobOutcome, ProcessEvent, Step, TargetPlan};
use std::path::Path;

/// `<count> file(s) blurred for <name>`, or nothing when no file was blurred.
pub fn format_level_summary(count: usize, name: &str) -> Option<String> {
    match count {
        0 => None,
        1 => Some(format!("1 file blurred for {name}")),
        n => Some(format!("{n} files blurred for {name}")),
    }
}

pub fn format_target_header(name: &str) -> String {
    format!("==> Target: {name}")
}

/// Path for display: relative to `base` when possible.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format a single progress event.
///
/// Level summaries are always shown; per-job lines only when `verbose`.
pub fn format_process_event(event: &ProcessEvent, base: &Path, verbose: bool) -> Vec<String> {
    match event {
        ProcessEvent::LevelFinished { level, count } => {
            format_level_summary(*count, level).into_iter().collect()
        }
        ProcessEvent::JobFinished { .. } if !verbose => Vec::new(),
        ProcessEvent::JobFinished {
            level,
            source,
            destination,
            outcome,
        } => {
            let source = display_path(source, base);
            let line = match outcome {
                JobOutcome::Blurred => {
                    format!("{source} \u{2192} {}", display_path(destination, base))
                }
                JobOutcome::AlreadyExists => format!(
                    "{source} ({} already exists)",
                    display_path(destination, base)
                ),
                JobOutcome::Animated => format!("{source} (animated, skipped)"),
            };
            vec![format!("    {level}: {line}")]
        }
    }
}

/// Format the plan of one target for `check`.
pub fn format_plan(plan: &TargetPlan, steps: &[Step<'_>]) -> Vec<String> {
    let mut lines = vec![format!(
        "{} (engine: {}, {} {})",
        plan.name,
        plan.engine,
        plan.sources.len(),
        if plan.sources.len() == 1 { "file" } else { "files" }
    )];

    let mut current = None;
    for step in steps {
        let Step::Blur(job) = step else { continue };
        let level = job.level;
        if current != Some(level.id()) {
            current = Some(level.id());
            lines.push(format!(
                "    {} {} (level {}, quality {})",
                level.id(),
                level.display_name,
                level.level_text(),
                level.options.quality
            ));
        }
        lines.push(job_line(&job.source, &job.destination, &plan.base_dir));
    }
    lines
}

fn job_line(source: &Path, destination: &Path, base: &Path) -> String {
    format!(
        "        {} \u{2192} {}",
        display_path(source, base),
        display_path(destination, base)
    )
}

/// Print a target header to stdout.
pub fn print_target_header(name: &str) {
    println!("{}", format_target_header(name));
}

/// Print the plan of one target to stdout.
pub fn print_plan(plan: &TargetPlan, steps: &[Step<'_>]) {
    for line in format_plan(plan, steps) {
        println!("{}", line);
    }
}
