//! Level names and destination paths.
//!
//! Every output gets its path from one of two modes, chosen per file group:
//!
//! - **Default mode**: the level's output name is inserted between the
//!   destination's stem and extension:
//!   `out/panther.jpg` + `-low` → `out/panther-low.jpg`.
//! - **Template mode**: `custom_dest` is rendered into a directory and the
//!   source's file name is kept as is:
//!   `out/{%= level %}/` + `panther.jpg` → `out/3/panther.jpg`.
//!
//! ## Display Names
//!
//! An explicit `name` wins. Otherwise the level's number is followed by the
//! percentage unit, whether or not the level was written as a percentage:
//! - `level = 2` → `2pc`
//! - `level = "50%"` → `50pc`
//! - `level = "1.50"` → `1.5pc`

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// `{%= field %}`, whitespace around the field optional.
static TEMPLATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%=\s*(.*?)\s*%\}").expect("template token regex"));

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Unknown field '{field}' in destination template '{template}'")]
    UnknownField { field: String, template: String },
}

/// Level text with `%` removed.
pub fn strip_percentage(level: &str) -> String {
    level.replace('%', "")
}

/// Numeric value of a level (`"50%"` → `50.0`).
pub fn level_magnitude(level: &str) -> Option<f64> {
    strip_percentage(level).parse().ok()
}

/// Name shown in reports and used in output file names.
pub fn display_name(name: Option<&str>, magnitude: f64, unit: &str) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{magnitude}{unit}"),
    }
}

/// Text inserted between file stem and extension in default mode.
///
/// With `rename` off only the suffix is used.
pub fn output_name(display_name: &str, separator: &str, suffix: Option<&str>, rename: bool) -> String {
    let suffix = suffix.unwrap_or_default();
    if rename {
        format!("{separator}{display_name}{suffix}")
    } else {
        suffix.to_string()
    }
}

/// `dirname(dest)/stem(dest) + output_name + ext(dest)`.
pub fn default_destination(dest: &Path, output_name: &str) -> PathBuf {
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match dest.extension() {
        Some(ext) => format!("{stem}{output_name}.{}", ext.to_string_lossy()),
        None => format!("{stem}{output_name}"),
    };
    dest.with_file_name(file_name)
}

/// `rendered_dir/filename(source)`.
pub fn template_destination(rendered_dir: &Path, source: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) => rendered_dir.join(name),
        None => rendered_dir.to_path_buf(),
    }
}

/// The `path` template field: a source's directory relative to its root,
/// with a trailing `/`, or empty for files directly under the root.
pub fn relative_dir(relative: &Path) -> String {
    let Some(parent) = relative.parent() else {
        return String::new();
    };
    let parts: Vec<String> = parent
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("{}/", parts.join("/"))
    }
}

/// Replace each `{%= field %}` with `lookup(field)`.
///
/// A field the lookup does not know is an error; text outside tokens is
/// copied unchanged.
pub fn render_template<F>(template: &str, lookup: F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;
    for caps in TEMPLATE_TOKEN.captures_iter(template) {
        let (Some(token), Some(field)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = lookup(field.as_str()).ok_or_else(|| TemplateError::UnknownField {
            field: field.as_str().to_string(),
            template: template.to_string(),
        })?;
        rendered.push_str(&template[last..token.start()]);
        rendered.push_str(&value);
        last = token.end();
    }
    rendered.push_str(&template[last..]);
    Ok(rendered)
}
