//! Task configuration module.
//!
//! Handles loading the task file, layering options, and describing file
//! groups. A task file holds task-wide options plus an ordered list of
//! targets; each target may override any option and lists its file groups.
//!
//! ## Task File
//!
//! ```toml
//! # All options are optional - defaults shown below
//! [options]
//! engine = "rust"           # rust, gm (GraphicsMagick) or im (ImageMagick)
//! skip_existing = true      # skip outputs that already exist
//! quality = 100             # encoding quality, must be > 1
//! rename = true             # add separator + level name to file names
//! separator = "-"           # between file stem and level name
//! allow_animated = false    # blur animated GIFs too
//!
//! [options.units]
//! percentage = "pc"         # suffix for generated level names ("2pc")
//!
//! [[targets]]
//! name = "thumbnails"
//!
//! [targets.options]         # overrides [options] for this target only
//! quality = 80
//!
//! [[targets.options.levels]]
//! level = 1
//! name = "low"
//!
//! [[targets.files]]
//! expand = true             # one job per matched file
//! cwd = "assets/"
//! src = ["**/*.{jpg,png}"]
//! dest = "build/"
//! # custom_dest = "build/{%= name %}/{%= path %}"
//! ```
//!
//! ## Layering
//!
//! Stock defaults are overridden by `[options]`, which is overridden by
//! `targets.options`. Tables merge key by key; arrays such as `levels`
//! replace wholesale. Unknown keys are rejected to catch typos early.

use crate::imaging::{EngineKind, UnknownEngine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error(
        "Unable to read configuration: no targets defined.\n\
         Have you specified a target? Add a [[targets]] table with files to the task file."
    )]
    NoTargets,
    #[error("Unknown target '{0}'")]
    UnknownTarget(String),
    #[error("No levels have been defined.")]
    NoLevels,
    #[error(transparent)]
    UnknownEngine(#[from] UnknownEngine),
    #[error("Unable to read configuration: a file group in target '{target}' has no `src`")]
    MissingSource { target: String },
    #[error("File group {src:?} has neither `dest` nor `custom_dest`")]
    MissingDestination { src: Vec<String> },
    #[error(
        "Unable to blur more than one image in compact format ({count} files match {src:?}).\n\
         For multiple files set `expand = true` on the file group."
    )]
    MultipleSources { src: Vec<String>, count: usize },
    #[error("Invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        source: globset::Error,
    },
    #[error("Failed to walk {}: {}", .path.display(), .source)]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Task file root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskConfig {
    /// Task-wide option overrides, kept raw so they can be layered.
    pub options: Option<toml::Value>,
    /// Targets in declaration order.
    pub targets: Vec<TargetConfig>,
}

/// A named set of option overrides and file groups.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub name: String,
    #[serde(default)]
    pub options: Option<toml::Value>,
    #[serde(default)]
    pub files: Vec<FileGroup>,
}

/// One file-group entry of a target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileGroup {
    /// Glob patterns; a leading `!` excludes matches.
    pub src: Vec<String>,
    /// Destination file (compact) or directory (expand).
    pub dest: Option<String>,
    /// Root that patterns are matched under.
    pub cwd: Option<String>,
    /// One single-source group per matched file.
    pub expand: bool,
    /// Destination directory template, e.g. `out/{%= level %}/`.
    pub custom_dest: Option<String>,
}

/// Options shared by every level of a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalOptions {
    /// Engine code: `rust`, `gm` or `im`.
    pub engine: String,
    /// Skip a job when its destination already exists.
    pub skip_existing: bool,
    /// Encoding quality; validated per level (`> 1`) and clamped to 100.
    pub quality: i64,
    /// Add separator + level name to output file names.
    pub rename: bool,
    pub separator: String,
    /// Blur multi-frame images instead of skipping them.
    pub allow_animated: bool,
    pub units: Units,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<BlurLevel>>,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            engine: EngineKind::Rust.code().to_string(),
            skip_existing: true,
            quality: 100,
            rename: true,
            separator: "-".to_string(),
            allow_animated: false,
            units: Units::default(),
            levels: None,
        }
    }
}

impl GlobalOptions {
    /// The engine selected by the `engine` option.
    pub fn engine_kind(&self) -> Result<EngineKind, ConfigError> {
        Ok(self.engine.parse()?)
    }
}

/// Unit suffixes for generated names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Units {
    pub percentage: String,
}

impl Default for Units {
    fn default() -> Self {
        Self {
            percentage: "pc".to_string(),
        }
    }
}

/// Per-level override. Every field is optional; `level` is validated later
/// so a bad level skips only itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurLevel {
    pub name: Option<String>,
    pub level: Option<LevelValue>,
    pub quality: Option<i64>,
    pub suffix: Option<String>,
    pub rename: Option<bool>,
}

/// A blur level as written: a number (`2`, `1.5`) or a string (`"50%"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for LevelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelValue::Number(n) => write!(f, "{n}"),
            LevelValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for LevelValue {
    fn from(n: f64) -> Self {
        LevelValue::Number(n)
    }
}

impl From<&str> for LevelValue {
    fn from(s: &str) -> Self {
        LevelValue::Text(s.to_string())
    }
}

// =============================================================================
// Config loading and layering
// =============================================================================

/// Returns the stock default options as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(GlobalOptions::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

impl TaskConfig {
    /// Layer stock defaults, task options and target options, then deserialize.
    pub fn options_for(&self, target: &TargetConfig) -> Result<GlobalOptions, ConfigError> {
        let mut merged = stock_defaults_value()?;
        for overlay in [&self.options, &target.options].into_iter().flatten() {
            merged = merge_toml(merged, overlay.clone());
        }
        Ok(merged.try_into()?)
    }

    /// Targets to run: all of them when `names` is empty, otherwise the
    /// named ones in task-file order.
    pub fn select_targets(&self, names: &[String]) -> Result<Vec<&TargetConfig>, ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.targets.iter().any(|t| &t.name == *n))
        {
            return Err(ConfigError::UnknownTarget(unknown.clone()));
        }
        Ok(self
            .targets
            .iter()
            .filter(|t| names.is_empty() || names.contains(&t.name))
            .collect())
    }
}

/// Load a task file.
pub fn load_config(path: &Path) -> Result<TaskConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Returns a fully-commented stock task file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# blurred-images task file
# ========================
# All options are optional. Values shown below are the defaults, except
# for the levels and the example target, which you will want to adapt.
# Unknown keys will cause an error.

[options]
# Graphics engine: "rust" (built in), "gm" (GraphicsMagick) or "im" (ImageMagick).
engine = "rust"

# Only produce files whose destination does not exist yet.
skip_existing = true

# Encoding quality. Must be greater than 1; values above 100 act as 100.
quality = 100

# Whether output names get separator + level name appended.
rename = true

# Separator between the file stem and the level name.
separator = "-"

# Animated GIFs are skipped unless this is set.
allow_animated = false

[options.units]
# Suffix for generated level names: level 2 without a name becomes "2pc".
percentage = "pc"

# ---------------------------------------------------------------------------
# Levels: one output per source image and level.
#   level   = blur radius, a number or a percentage string ("50%")
#   name    = used in file names and templates (default: "<level>pc")
#   quality = per-level quality override
#   suffix  = appended after the name
#   rename  = per-level rename override
# ---------------------------------------------------------------------------
[[options.levels]]
name = "low"
level = 1

[[options.levels]]
name = "medium"
level = 5

[[options.levels]]
name = "high"
level = 9

# ---------------------------------------------------------------------------
# Targets run in order. `blurred-images run <name>` runs just one.
# ---------------------------------------------------------------------------
[[targets]]
name = "default"

[[targets.files]]
# expand = true: every file matched under cwd becomes its own job and lands
# at dest/<relative path>. Without expand, src must match exactly one file
# and dest is the output file itself.
expand = true
cwd = "assets/images"
src = ["**/*.{jpg,jpeg,png,gif}"]
dest = "build/images"

# Instead of dest, a directory template can place each level separately.
# Tokens: {%= level %}, {%= name %}, {%= id %}, {%= path %} (source
# directory relative to cwd) and any other option.
# custom_dest = "build/blurred/{%= name %}/{%= path %}"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn task(toml_str: &str) -> TaskConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn default_options() {
        let options = GlobalOptions::default();
        assert_eq!(options.engine, "rust");
        assert!(options.skip_existing);
        assert_eq!(options.quality, 100);
        assert!(options.rename);
        assert_eq!(options.separator, "-");
        assert!(!options.allow_animated);
        assert_eq!(options.units.percentage, "pc");
        assert!(options.levels.is_none());
    }

    #[test]
    fn level_value_parses_numbers_and_strings() {
        let options: GlobalOptions = toml::from_str(
            r#"
[[levels]]
level = 2

[[levels]]
level = 1.5

[[levels]]
level = "50%"
"#,
        )
        .unwrap();
        let levels = options.levels.unwrap();
        assert_eq!(levels[0].level, Some(LevelValue::Number(2.0)));
        assert_eq!(levels[1].level, Some(LevelValue::Number(1.5)));
        assert_eq!(levels[2].level, Some(LevelValue::Text("50%".into())));
    }

    #[test]
    fn level_value_display_matches_source_text() {
        assert_eq!(LevelValue::Number(2.0).to_string(), "2");
        assert_eq!(LevelValue::Number(1.5).to_string(), "1.5");
        assert_eq!(LevelValue::Number(-1.0).to_string(), "-1");
        assert_eq!(LevelValue::from("50%").to_string(), "50%");
    }

    #[test]
    fn unknown_option_rejected() {
        let result: Result<GlobalOptions, _> = toml::from_str("qualty = 5");
        assert!(result.is_err());
    }

    #[test]
    fn levels_must_be_a_list() {
        let result: Result<GlobalOptions, _> = toml::from_str("levels = 3");
        assert!(result.is_err());
    }

    #[test]
    fn target_options_override_task_options() {
        let config = task(
            r#"
[options]
engine = "gm"
quality = 90

[[options.levels]]
level = 1

[[targets]]
name = "a"
[targets.options]
quality = 40

[[targets]]
name = "b"
"#,
        );

        let a = config.options_for(&config.targets[0]).unwrap();
        assert_eq!(a.quality, 40);
        assert_eq!(a.engine, "gm");
        assert_eq!(a.separator, "-");

        let b = config.options_for(&config.targets[1]).unwrap();
        assert_eq!(b.quality, 90);
        assert_eq!(b.levels.unwrap().len(), 1);
    }

    #[test]
    fn target_levels_replace_task_levels() {
        let config = task(
            r#"
[[options.levels]]
level = 1
[[options.levels]]
level = 2

[[targets]]
name = "t"
[[targets.options.levels]]
level = 7
name = "only"
"#,
        );
        let options = config.options_for(&config.targets[0]).unwrap();
        let levels = options.levels.unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].name.as_deref(), Some("only"));
    }

    #[test]
    fn unknown_key_in_target_options_is_error() {
        let config = task(
            r#"
[[targets]]
name = "t"
[targets.options]
tryAnimated = true
"#,
        );
        assert!(matches!(
            config.options_for(&config.targets[0]),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn engine_kind_resolves_or_fails() {
        let mut options = GlobalOptions::default();
        assert_eq!(options.engine_kind().unwrap(), EngineKind::Rust);
        options.engine = "im".into();
        assert_eq!(options.engine_kind().unwrap(), EngineKind::ImageMagick);
        options.engine = "nope".into();
        assert!(matches!(
            options.engine_kind(),
            Err(ConfigError::UnknownEngine(_))
        ));
    }

    #[test]
    fn select_targets_all_named_and_unknown() {
        let config = task(
            r#"
[[targets]]
name = "one"
[[targets]]
name = "two"
[[targets]]
name = "three"
"#,
        );
        let all: Vec<&str> = config
            .select_targets(&[])
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(all, ["one", "two", "three"]);

        let picked: Vec<&str> = config
            .select_targets(&["three".into(), "one".into()])
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(picked, ["one", "three"]);

        assert!(matches!(
            config.select_targets(&["four".into()]),
            Err(ConfigError::UnknownTarget(name)) if name == "four"
        ));
    }

    #[test]
    fn select_targets_without_targets_is_error() {
        let config = TaskConfig::default();
        assert!(matches!(
            config.select_targets(&[]),
            Err(ConfigError::NoTargets)
        ));
    }

    #[test]
    fn parse_file_groups() {
        let config = task(
            r#"
[[targets]]
name = "t"

[[targets.files]]
src = ["a.jpg"]
dest = "out/a.jpg"

[[targets.files]]
expand = true
cwd = "assets/"
src = ["**/*.png", "!skip/*.png"]
custom_dest = "out/{%= level %}/"
"#,
        );
        let files = &config.targets[0].files;
        assert_eq!(files.len(), 2);
        assert!(!files[0].expand);
        assert_eq!(files[0].dest.as_deref(), Some("out/a.jpg"));
        assert!(files[1].expand);
        assert_eq!(files[1].src.len(), 2);
        assert_eq!(files[1].custom_dest.as_deref(), Some("out/{%= level %}/"));
    }

    #[test]
    fn stock_config_parses_and_resolves() {
        let config = task(stock_config_toml());
        assert_eq!(config.targets.len(), 1);
        let options = config.options_for(&config.targets[0]).unwrap();
        let names: Vec<String> = options
            .levels
            .unwrap()
            .into_iter()
            .filter_map(|l| l.name)
            .collect();
        assert_eq!(names, ["low", "medium", "high"]);
        assert_eq!(options.engine, "rust");
    }

    #[test]
    fn stock_defaults_value_round_trips() {
        let options: GlobalOptions = stock_defaults_value().unwrap().try_into().unwrap();
        assert_eq!(options.quality, 100);
        assert!(options.levels.is_none());
    }

    #[test]
    fn merge_toml_overlay_wins_and_base_survives() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("a = 5\n[t]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(5));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blurred-images.toml");
        fs::write(
            &path,
            r#"
[options]
separator = "_"

[[targets]]
name = "only"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.targets[0].name, "only");
        assert_eq!(
            config.options_for(&config.targets[0]).unwrap().separator,
            "_"
        );
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blurred-images.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }
}
