//! Level resolution and validation.
//!
//! Every entry of `levels` becomes one [`ResolvedOptions`]: the target's
//! [`GlobalOptions`] with the entry's overrides applied and a sequential id.
//! Each resolved level is then validated on its own; a bad level is logged
//! and dropped without affecting the others.
//!
//! ```text
//! GlobalOptions + [BlurLevel, ...]
//!     → resolve_levels  → [ResolvedOptions]   (fatal if levels missing/empty)
//!     → Level::new      → [Level]             (invalid levels warned + skipped)
//! ```

use crate::config::{BlurLevel, ConfigError, GlobalOptions, LevelValue, Units};
use crate::imaging::Blur;
use crate::naming;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

/// Digits with at most one decimal point and an optional trailing `%`.
static LEVEL_GRAMMAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]*\.?[0-9]+%?$").expect("level grammar regex"));

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LevelError {
    #[error("Level must be specified.")]
    Missing,
    #[error("Level is invalid ({0})")]
    InvalidLevel(String),
    #[error(
        "Quality must be greater than 1 (got {0}). \
         Quality configuration has changed to values between 1 - 100. Please update your configuration"
    )]
    InvalidQuality(i64),
}

/// Global options merged with one level's overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// Position in the `levels` array.
    pub id: usize,
    pub name: Option<String>,
    pub level: Option<LevelValue>,
    pub quality: i64,
    pub suffix: Option<String>,
    pub rename: bool,
    pub separator: String,
    pub engine: String,
    pub skip_existing: bool,
    pub allow_animated: bool,
    pub units: Units,
}

/// Apply one level's overrides on top of the global options.
pub fn resolve(global: &GlobalOptions, id: usize, level: &BlurLevel) -> ResolvedOptions {
    ResolvedOptions {
        id,
        name: level.name.clone(),
        level: level.level.clone(),
        quality: level.quality.unwrap_or(global.quality),
        suffix: level.suffix.clone(),
        rename: level.rename.unwrap_or(global.rename),
        separator: global.separator.clone(),
        engine: global.engine.clone(),
        skip_existing: global.skip_existing,
        allow_animated: global.allow_animated,
        units: global.units.clone(),
    }
}

/// Resolve every level in declaration order, ids starting at 0.
pub fn resolve_levels(global: &GlobalOptions) -> Result<Vec<ResolvedOptions>, ConfigError> {
    match global.levels.as_deref() {
        Some(levels) if !levels.is_empty() => Ok(levels
            .iter()
            .enumerate()
            .map(|(id, level)| resolve(global, id, level))
            .collect()),
        _ => Err(ConfigError::NoLevels),
    }
}

/// Whether `text` is a valid level: `1`, `1.5`, `.5`, `50%`, `11.11%`.
pub fn is_valid_level(text: &str) -> bool {
    LEVEL_GRAMMAR.is_match(text)
}

/// Check level grammar and quality bounds.
pub fn validate(options: &ResolvedOptions) -> Result<(), LevelError> {
    let level = options.level.as_ref().ok_or(LevelError::Missing)?.to_string();
    if !is_valid_level(&level) {
        return Err(LevelError::InvalidLevel(level));
    }
    if options.quality <= 1 {
        return Err(LevelError::InvalidQuality(options.quality));
    }
    Ok(())
}

/// A validated level with its derived names and blur radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub options: ResolvedOptions,
    /// Explicit name, or `<level><units.percentage>`.
    pub display_name: String,
    /// Inserted between the file stem and extension in default mode.
    pub output_name: String,
    /// Level value with any `%` stripped.
    pub radius: f64,
}

impl Level {
    pub fn new(options: ResolvedOptions) -> Result<Self, LevelError> {
        validate(&options)?;
        let text = options
            .level
            .as_ref()
            .map(LevelValue::to_string)
            .unwrap_or_default();
        let radius = naming::level_magnitude(&text).ok_or(LevelError::InvalidLevel(text))?;

        let display_name =
            naming::display_name(options.name.as_deref(), radius, &options.units.percentage);
        let output_name = naming::output_name(
            &display_name,
            &options.separator,
            options.suffix.as_deref(),
            options.rename,
        );

        Ok(Self {
            options,
            display_name,
            output_name,
            radius,
        })
    }

    pub fn id(&self) -> usize {
        self.options.id
    }

    /// The level as written, `%` included.
    pub fn level_text(&self) -> String {
        self.options
            .level
            .as_ref()
            .map(LevelValue::to_string)
            .unwrap_or_default()
    }

    pub fn blur(&self) -> Blur {
        Blur::from_radius(self.radius)
    }

    /// Quality handed to the engine, clamped to 1–100.
    pub fn quality(&self) -> u32 {
        self.options.quality.clamp(1, 100) as u32
    }

    /// Value of a template field, or `None` for an unknown field.
    ///
    /// Known fields without a value (e.g. `suffix`) render as `""`.
    pub fn field(&self, field: &str) -> Option<String> {
        let options = &self.options;
        let value = match field {
            "id" => options.id.to_string(),
            "name" => self.display_name.clone(),
            "level" => self.level_text(),
            "quality" => options.quality.to_string(),
            "suffix" => options.suffix.clone().unwrap_or_default(),
            "rename" => options.rename.to_string(),
            "separator" => options.separator.clone(),
            "engine" => options.engine.clone(),
            "skip_existing" => options.skip_existing.to_string(),
            "allow_animated" => options.allow_animated.to_string(),
            "output_name" => self.output_name.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// Resolve and validate the levels of a target.
///
/// Fails only when `levels` is missing or empty; invalid levels are logged
/// and left out, keeping the ids of the remaining ones.
pub fn prepare_levels(global: &GlobalOptions) -> Result<Vec<Level>, ConfigError> {
    let mut levels = Vec::new();
    for options in resolve_levels(global)? {
        let id = options.id;
        match Level::new(options) {
            Ok(level) => levels.push(level),
            Err(err) => warn!(level = id, "{err}"),
        }
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(value: impl Into<LevelValue>) -> BlurLevel {
        BlurLevel {
            level: Some(value.into()),
            ..BlurLevel::default()
        }
    }

    fn global_with(levels: Vec<BlurLevel>) -> GlobalOptions {
        GlobalOptions {
            levels: Some(levels),
            ..GlobalOptions::default()
        }
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    #[test]
    fn grammar_accepts_numbers_and_percentages() {
        for valid in ["1", "1%", "1.1%", "11.11111%", "111111%", ".5", "0", "007"] {
            assert!(is_valid_level(valid), "{valid} should be valid");
        }
    }

    #[test]
    fn grammar_rejects_malformed_levels() {
        for invalid in ["-1", "1.1.1%", "1a", "a1", "1.", "", "%", "1%%", " 1", "1 %"] {
            assert!(!is_valid_level(invalid), "{invalid} should be invalid");
        }
    }

    // =========================================================================
    // Resolver
    // =========================================================================

    #[test]
    fn resolve_assigns_sequential_ids_in_order() {
        let global = global_with(vec![level(1.0), level(3.0), level("50%")]);
        let resolved = resolve_levels(&global).unwrap();
        let ids: Vec<usize> = resolved.iter().map(|r| r.id).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert_eq!(resolved[2].level, Some(LevelValue::from("50%")));
    }

    #[test]
    fn resolve_applies_global_defaults_and_overrides() {
        let mut global = global_with(vec![
            BlurLevel {
                quality: Some(40),
                rename: Some(false),
                suffix: Some("_x".into()),
                ..level(1.0)
            },
            level(2.0),
        ]);
        global.quality = 80;
        global.separator = "_".into();

        let resolved = resolve_levels(&global).unwrap();
        assert_eq!(resolved[0].quality, 40);
        assert!(!resolved[0].rename);
        assert_eq!(resolved[0].suffix.as_deref(), Some("_x"));
        assert_eq!(resolved[1].quality, 80);
        assert!(resolved[1].rename);
        assert_eq!(resolved[1].separator, "_");
    }

    #[test]
    fn missing_or_empty_levels_is_fatal() {
        let missing = GlobalOptions::default();
        assert!(matches!(
            resolve_levels(&missing),
            Err(ConfigError::NoLevels)
        ));
        let empty = global_with(Vec::new());
        assert!(matches!(resolve_levels(&empty), Err(ConfigError::NoLevels)));
    }

    // =========================================================================
    // Validator
    // =========================================================================

    #[test]
    fn validate_rejects_missing_level() {
        let options = resolve(&GlobalOptions::default(), 0, &BlurLevel::default());
        assert_eq!(validate(&options), Err(LevelError::Missing));
    }

    #[test]
    fn validate_rejects_negative_number() {
        let options = resolve(&GlobalOptions::default(), 0, &level(-1.0));
        assert_eq!(
            validate(&options),
            Err(LevelError::InvalidLevel("-1".into()))
        );
    }

    #[test]
    fn validate_quality_must_exceed_one() {
        let mut options = resolve(&GlobalOptions::default(), 0, &level(2.0));
        options.quality = 1;
        assert_eq!(validate(&options), Err(LevelError::InvalidQuality(1)));
        options.quality = 2;
        assert_eq!(validate(&options), Ok(()));
    }

    // =========================================================================
    // Level
    // =========================================================================

    #[test]
    fn unnamed_level_gets_percentage_name() {
        let lvl = Level::new(resolve(&GlobalOptions::default(), 0, &level(2.0))).unwrap();
        assert_eq!(lvl.display_name, "2pc");
        assert_eq!(lvl.output_name, "-2pc");
        assert_eq!(lvl.radius, 2.0);
    }

    #[test]
    fn explicit_name_wins() {
        let named = BlurLevel {
            name: Some("low".into()),
            ..level(2.0)
        };
        let lvl = Level::new(resolve(&GlobalOptions::default(), 0, &named)).unwrap();
        assert_eq!(lvl.display_name, "low");
        assert_eq!(lvl.output_name, "-low");
    }

    #[test]
    fn percentage_level_strips_sign_for_radius_only() {
        let lvl = Level::new(resolve(&GlobalOptions::default(), 0, &level("50%"))).unwrap();
        assert_eq!(lvl.radius, 50.0);
        assert_eq!(lvl.level_text(), "50%");
        assert_eq!(lvl.display_name, "50pc");
        assert_eq!(lvl.field("level").as_deref(), Some("50%"));
        assert_eq!(lvl.blur().sigma, 50.0 / 3.0);
    }

    #[test]
    fn custom_percentage_unit() {
        let mut global = GlobalOptions::default();
        global.units.percentage = "pct".into();
        let lvl = Level::new(resolve(&global, 0, &level("1.50%"))).unwrap();
        assert_eq!(lvl.display_name, "1.5pct");
    }

    #[test]
    fn quality_is_clamped_for_the_engine() {
        let mut options = resolve(&GlobalOptions::default(), 0, &level(1.0));
        options.quality = 250;
        assert_eq!(Level::new(options).unwrap().quality(), 100);
    }

    #[test]
    fn fields_cover_options() {
        let lvl = Level::new(resolve(
            &GlobalOptions::default(),
            4,
            &BlurLevel {
                name: Some("high".into()),
                ..level(3.0)
            },
        ))
        .unwrap();
        assert_eq!(lvl.field("id").as_deref(), Some("4"));
        assert_eq!(lvl.field("name").as_deref(), Some("high"));
        assert_eq!(lvl.field("level").as_deref(), Some("3"));
        assert_eq!(lvl.field("quality").as_deref(), Some("100"));
        assert_eq!(lvl.field("suffix").as_deref(), Some(""));
        assert_eq!(lvl.field("output_name").as_deref(), Some("-high"));
        assert_eq!(lvl.field("engine").as_deref(), Some("rust"));
        assert_eq!(lvl.field("bogus"), None);
    }

    #[test]
    fn prepare_levels_skips_invalid_and_keeps_ids() {
        let global = global_with(vec![
            level(1.0),
            level("1.1.1%"),
            BlurLevel {
                quality: Some(0),
                ..level(2.0)
            },
            level("a1"),
            level(9.0),
        ]);
        let levels = prepare_levels(&global).unwrap();
        let ids: Vec<usize> = levels.iter().map(Level::id).collect();
        assert_eq!(ids, [0, 4]);
    }
}
