//! File-group expansion.
//!
//! Turns a target's `[[targets.files]]` entries into concrete source files.
//!
//! ## Patterns
//!
//! `src` holds globs (`*`, `**`, `?`, `{a,b}`) matched against paths relative
//! to the group's `cwd`. `*` does not cross directory boundaries. Patterns
//! apply in order: a plain pattern adds its matches, a `!`-prefixed pattern
//! removes matches collected so far.
//!
//! ## Modes
//!
//! - **Expand** (`expand = true`): every match is its own source, written to
//!   `dest/<path relative to cwd>`.
//! - **Compact** (`expand = false`): the patterns name one file and `dest` is
//!   the literal destination file. More than one match is an error.
//!
//! Matches are returned in directory-walk order sorted by file name, so runs
//! are reproducible.

use crate::config::{ConfigError, FileGroup};
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One source image selected by a file group.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Absolute (or base-relative) path to the image.
    pub source: PathBuf,
    /// Path relative to the group's `cwd`.
    pub relative: PathBuf,
    /// Destination before level naming is applied. `None` in template mode.
    pub dest: Option<PathBuf>,
    /// Destination directory template, rendered per level.
    pub custom_dest: Option<String>,
}

struct Pattern {
    text: String,
    exclude: bool,
    matcher: GlobMatcher,
}

fn compile(pattern: &str) -> Result<Pattern, ConfigError> {
    let (exclude, glob) = match pattern.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let glob = glob.strip_prefix("./").unwrap_or(glob);
    let matcher = GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigError::Glob {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();
    Ok(Pattern {
        text: pattern.to_string(),
        exclude,
        matcher,
    })
}

/// Every file under `root`, relative to it, sorted by name per directory.
fn walk_files(root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ConfigError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

/// Match `patterns` against the files under `root`, in pattern order.
pub fn match_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, ConfigError> {
    let patterns = patterns
        .iter()
        .map(|p| compile(p))
        .collect::<Result<Vec<_>, _>>()?;

    if !root.is_dir() {
        debug!("Source root {} does not exist", root.display());
        return Ok(Vec::new());
    }
    let candidates = walk_files(root)?;

    let mut selected: Vec<PathBuf> = Vec::new();
    for pattern in &patterns {
        if pattern.exclude {
            selected.retain(|path| !pattern.matcher.is_match(path));
            continue;
        }
        let before = selected.len();
        for path in &candidates {
            if pattern.matcher.is_match(path) && !selected.contains(path) {
                selected.push(path.clone());
            }
        }
        debug!(
            "Pattern '{}' matched {} new file(s)",
            pattern.text,
            selected.len() - before
        );
    }
    Ok(selected)
}

/// Expand one file group into its source files.
///
/// Relative `cwd` and `dest` resolve against `base_dir`.
pub fn expand_group(
    group: &FileGroup,
    base_dir: &Path,
    target: &str,
) -> Result<Vec<SourceFile>, ConfigError> {
    if group.src.is_empty() {
        return Err(ConfigError::MissingSource {
            target: target.to_string(),
        });
    }
    if group.dest.is_none() && group.custom_dest.is_none() {
        return Err(ConfigError::MissingDestination {
            src: group.src.clone(),
        });
    }

    let root = match &group.cwd {
        Some(cwd) => base_dir.join(cwd),
        None => base_dir.to_path_buf(),
    };
    let dest = group.dest.as_ref().map(|d| base_dir.join(d));
    let matches = match_patterns(&root, &group.src)?;

    if !group.expand && matches.len() > 1 {
        return Err(ConfigError::MultipleSources {
            src: group.src.clone(),
            count: matches.len(),
        });
    }
    if !group.expand && matches.is_empty() {
        warn!(
            target_name = target,
            src = ?group.src,
            "No file matches under {}",
            root.display()
        );
    }

    Ok(matches
        .into_iter()
        .map(|relative| SourceFile {
            source: root.join(&relative),
            dest: dest.as_ref().map(|d| {
                if group.expand {
                    d.join(&relative)
                } else {
                    d.clone()
                }
            }),
            custom_dest: group.custom_dest.clone(),
            relative,
        })
        .collect())
}

/// Expand every file group of a target, in declaration order.
pub fn expand_groups(
    groups: &[FileGroup],
    base_dir: &Path,
    target: &str,
) -> Result<Vec<SourceFile>, ConfigError> {
    let mut sources = Vec::new();
    for group in groups {
        sources.extend(expand_group(group, base_dir, target)?);
    }
    Ok(sources)
}
