//! Argument templates and output naming
//!
//! Argument templates are printf-style strings such as `-timestep %g` or
//! `-flirt %s %s`. Each whitespace-separated word becomes one piece: either
//! literal text or a slot holding a single placeholder. Parsed templates are
//! cached, since the same `'static` template is rendered for every
//! invocation of a command.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::WbError;
use crate::value::Value;

/// Placeholder syntax: `%s`, `%d`, `%g` or `%.Nf`
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(s|d|g|\.(\d+)f)").expect("placeholder regex is valid"));

/// Extensions treated as a single unit when splitting file names
const COMPOUND_EXTENSIONS: &[&str] = &[".nii.gz", ".tar.gz", ".niml.dset"];

/// Naming template used when a derived field does not declare one
pub const DEFAULT_NAME_TEMPLATE: &str = "%s_generated";

/// How a slot formats its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `%s`: value as written
    Str,
    /// `%d`: integer
    Int,
    /// `%g`: shortest general float form, 6 significant digits
    General,
    /// `%.Nf`: fixed decimals
    Fixed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Literal(String),
    Slot {
        before: String,
        format: Format,
        after: String,
    },
}

/// A parsed argument template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgTemplate {
    pieces: Vec<Piece>,
}

impl ArgTemplate {
    /// Parse a template string without caching
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut pieces = Vec::new();

        for word in template.split_whitespace() {
            let mut matches = PLACEHOLDER.captures_iter(word);
            let Some(caps) = matches.next() else {
                pieces.push(Piece::Literal(word.to_string()));
                continue;
            };
            if matches.next().is_some() {
                return Err(format!("'{}' holds more than one placeholder", word));
            }

            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let format = match &caps[1] {
                "s" => Format::Str,
                "d" => Format::Int,
                "g" => Format::General,
                _ => {
                    let digits = caps.get(2).map(|m| m.as_str()).unwrap_or("0");
                    let precision = digits
                        .parse()
                        .map_err(|_| format!("bad precision in '{}'", word))?;
                    Format::Fixed(precision)
                }
            };
            pieces.push(Piece::Slot {
                before: word[..whole.start].to_string(),
                format,
                after: word[whole.end..].to_string(),
            });
        }

        Ok(Self { pieces })
    }

    /// Number of placeholders in the template
    pub fn slots(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| matches!(p, Piece::Slot { .. }))
            .count()
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Render the template, consuming one value per slot in order.
    ///
    /// A list value expands its slot into one token per element.
    pub fn fill(&self, field: &str, values: &[&Value]) -> Result<Vec<String>, WbError> {
        let mut tokens = Vec::with_capacity(self.pieces.len());
        let mut values = values.iter();

        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => tokens.push(text.clone()),
                Piece::Slot {
                    before,
                    format,
                    after,
                } => {
                    let value = values.next().ok_or_else(|| {
                        WbError::definition(field, "template has more slots than values")
                    })?;
                    match value {
                        Value::List(items) => {
                            for item in items {
                                let text = format_value(field, *format, item)?;
                                tokens.push(format!("{}{}{}", before, text, after));
                            }
                        }
                        scalar => {
                            let text = format_value(field, *format, scalar)?;
                            tokens.push(format!("{}{}{}", before, text, after));
                        }
                    }
                }
            }
        }

        Ok(tokens)
    }
}

/// Cache of parsed templates, keyed by the static template text
pub struct TemplateCache {
    cache: DashMap<&'static str, Arc<ArgTemplate>>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCache {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Parse template (with caching)
    pub fn get(&self, template: &'static str) -> Result<Arc<ArgTemplate>, String> {
        if let Some(cached) = self.cache.get(template) {
            return Ok(Arc::clone(&cached));
        }

        let parsed = Arc::new(ArgTemplate::parse(template)?);
        self.cache.insert(template, Arc::clone(&parsed));
        Ok(parsed)
    }
}

/// Global template cache instance
pub static TEMPLATES: Lazy<TemplateCache> = Lazy::new(TemplateCache::new);

/// Fetch a parsed template from the global cache, reporting syntax errors
/// against the owning field.
pub fn arg_template(field: &str, template: &'static str) -> Result<Arc<ArgTemplate>, WbError> {
    TEMPLATES
        .get(template)
        .map_err(|details| WbError::definition(field, details))
}

fn format_value(field: &str, format: Format, value: &Value) -> Result<String, WbError> {
    let mismatch = |expected| WbError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: value.type_name(),
    };

    match format {
        Format::Str => Ok(match value {
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{:.1}", f),
            other => other.to_string(),
        }),
        Format::Int => match value {
            Value::Int(i) => Ok(i.to_string()),
            _ => Err(mismatch("integer")),
        },
        Format::General => value
            .as_float()
            .map(format_general)
            .ok_or_else(|| mismatch("number")),
        Format::Fixed(precision) => value
            .as_float()
            .map(|f| format!("{:.*}", precision, f))
            .ok_or_else(|| mismatch("number")),
    }
}

/// `%g` formatting: 6 significant digits, trailing zeros stripped,
/// exponent form below 1e-4 and from 1e6 upwards.
pub fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:.5e}", value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (5 - exponent) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_trailing_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Split a file name into base and extension, keeping compound
/// extensions such as `.nii.gz` together.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    let lower = file_name.to_ascii_lowercase();
    for ext in COMPOUND_EXTENSIONS {
        if lower.ends_with(ext) && file_name.len() > ext.len() {
            let cut = file_name.len() - ext.len();
            return file_name.split_at(cut);
        }
    }

    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// Derive an output file name from a source path.
///
/// The source's base name (file name without extension) replaces `%s` in the
/// template. With `keep_extension`, a result that has no extension of its
/// own takes the source's.
pub fn derive_name(source: &str, template: Option<&str>, keep_extension: bool) -> String {
    let file_name = Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    let (base, source_ext) = split_extension(&file_name);

    let name = template
        .unwrap_or(DEFAULT_NAME_TEMPLATE)
        .replacen("%s", base, 1);

    if keep_extension && split_extension(&name).1.is_empty() {
        format!("{}{}", name, source_ext)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_and_slot() {
        let t = ArgTemplate::parse("-timestep %g").unwrap();
        assert_eq!(t.slots(), 1);
        assert_eq!(t.pieces()[0], Piece::Literal("-timestep".into()));
        assert!(matches!(
            t.pieces()[1],
            Piece::Slot {
                format: Format::General,
                ..
            }
        ));
    }

    #[test]
    fn parse_fixed_precision() {
        let t = ArgTemplate::parse("%.1f").unwrap();
        assert!(matches!(
            t.pieces()[0],
            Piece::Slot {
                format: Format::Fixed(1),
                ..
            }
        ));
    }

    #[test]
    fn parse_rejects_two_placeholders_in_one_word() {
        assert!(ArgTemplate::parse("%s=%s").is_err());
    }

    #[test]
    fn fill_expands_lists() {
        let t = ArgTemplate::parse("--sessions %s").unwrap();
        let sessions = Value::from(vec!["sub1-ses1", "sub1-ses2"]);
        let tokens = t.fill("sessions", &[&sessions]).unwrap();
        assert_eq!(tokens, vec!["--sessions", "sub1-ses1", "sub1-ses2"]);
    }

    #[test]
    fn fill_with_two_slots() {
        let t = ArgTemplate::parse("-flirt %s %s").unwrap();
        let a = Value::from("epi.nii");
        let b = Value::from("T1w.nii");
        assert_eq!(
            t.fill("flirt", &[&a, &b]).unwrap(),
            vec!["-flirt", "epi.nii", "T1w.nii"]
        );
    }

    #[test]
    fn fixed_format_pads_integers() {
        let t = ArgTemplate::parse("%.1f").unwrap();
        assert_eq!(t.fill("series_start", &[&Value::Int(0)]).unwrap(), vec!["0.0"]);
        assert_eq!(t.fill("series_step", &[&Value::Float(0.8)]).unwrap(), vec!["0.8"]);
    }

    #[test]
    fn int_format_rejects_text() {
        let t = ArgTemplate::parse("%d").unwrap();
        let err = t.fill("distance", &[&Value::from("ten")]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn general_format_matches_printf() {
        assert_eq!(format_general(0.0), "0");
        assert_eq!(format_general(1.0), "1");
        assert_eq!(format_general(0.8), "0.8");
        assert_eq!(format_general(2.5), "2.5");
        assert_eq!(format_general(123456.7), "123457");
        assert_eq!(format_general(1e6), "1e+06");
        assert_eq!(format_general(0.00001), "1e-05");
        assert_eq!(format_general(-0.25), "-0.25");
    }

    #[test]
    fn cache_reuse() {
        let cache = TemplateCache::new();
        let a = cache.get("-unit %s").unwrap();
        let b = cache.get("-unit %s").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn split_compound_extension() {
        assert_eq!(split_extension("atlas.nii.gz"), ("atlas", ".nii.gz"));
        assert_eq!(split_extension("func.dtseries.nii"), ("func.dtseries", ".nii"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn derive_labels_name() {
        assert_eq!(
            derive_name("atlas.nii", Some("%s_labels.nii.gz"), false),
            "atlas_labels.nii.gz"
        );
    }

    #[test]
    fn derive_uses_file_name_only() {
        assert_eq!(
            derive_name("/data/sub-01/functional.nii", Some("%s.dtseries.nii"), false),
            "functional.dtseries.nii"
        );
    }

    #[test]
    fn derive_keeps_template_extension() {
        assert_eq!(
            derive_name("functional.nii", Some("resampled_%s.nii.gz"), true),
            "resampled_functional.nii.gz"
        );
    }

    #[test]
    fn derive_appends_source_extension_when_missing() {
        assert_eq!(derive_name("atlas.nii.gz", Some("%s_copy"), true), "atlas_copy.nii.gz");
        assert_eq!(derive_name("atlas.nii.gz", Some("%s_copy"), false), "atlas_copy");
    }

    #[test]
    fn derive_default_template() {
        assert_eq!(
            derive_name("func.dtseries.nii", None, false),
            "func.dtseries_generated"
        );
    }
}
