//! Placeholder type specs: shape, coercion and rendering
//!
//! A type spec is the text after the `:` in `{name:spec}`. It decides both the
//! mini-pattern handed to the segment matcher and how the captured text is
//! coerced into a [`FieldValue`].

use crate::error::TemplateError;
use crate::value::FieldValue;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Spec marking a placeholder that may cross path separators
pub const SPANNING_SPEC: &str = "**";

/// Mini-pattern for an untyped placeholder
const DEFAULT_PATTERN: &str = "[^/]+";

/// Coercion function of a user-declared type
pub type CoerceFn = Arc<dyn Fn(&str) -> Result<FieldValue, String> + Send + Sync>;

/// User-declared placeholder type: a sub-pattern plus a coercion
#[derive(Clone)]
pub struct CustomType {
    name: String,
    pattern: String,
    coerce: CoerceFn,
}

impl CustomType {
    pub fn new<F>(name: &str, pattern: &str, coerce: F) -> Self
    where
        F: Fn(&str) -> Result<FieldValue, String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            coerce: Arc::new(coerce),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Caller-owned set of custom placeholder types, keyed by spec name
#[derive(Debug, Clone, Default)]
pub struct CustomTypeRegistry {
    types: HashMap<String, CustomType>,
}

impl CustomTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any earlier type of the same name
    pub fn register(&mut self, custom: CustomType) -> &mut Self {
        self.types.insert(custom.name.clone(), custom);
        self
    }

    pub fn with(mut self, custom: CustomType) -> Self {
        self.register(custom);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CustomType> {
        self.types.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Resolved type of a placeholder
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// Any non-empty text within one path component
    Str,
    /// Integer; width constrains digit count and padding, never the value range
    Int { width: Option<usize>, zero_pad: bool },
    /// Floating point number, optionally with a fixed number of decimals
    Float { precision: Option<usize> },
    /// Date or date-time in a strftime format
    Date { format: String, has_time: bool },
    /// Registered user type
    Custom(CustomType),
    /// Free sub-pattern matched verbatim by the segment matcher
    Pattern(String),
    /// Any text, separators included
    Spanning,
}

impl TypeSpec {
    /// Resolve a raw spec string
    ///
    /// `name` is only used for error messages.
    pub fn parse(
        name: &str,
        raw: Option<&str>,
        registry: &CustomTypeRegistry,
    ) -> Result<Self, TemplateError> {
        let Some(raw) = raw else {
            return Ok(Self::Str);
        };

        if raw.is_empty() || raw == "s" {
            return Ok(Self::Str);
        }
        if raw == SPANNING_SPEC {
            return Ok(Self::Spanning);
        }
        if let Some(custom) = registry.get(raw) {
            regex::Regex::new(&custom.pattern)
                .map_err(|e| TemplateError::invalid_spec(name, raw, e.to_string()))?;
            return Ok(Self::Custom(custom.clone()));
        }
        if let Some(int) = parse_int_spec(raw) {
            return Ok(int);
        }
        if let Some(float) = parse_float_spec(raw) {
            return Ok(float);
        }
        if raw.contains('%') {
            return parse_date_spec(name, raw);
        }

        regex::Regex::new(raw)
            .map_err(|e| TemplateError::invalid_spec(name, raw, e.to_string()))?;
        Ok(Self::Pattern(raw.to_string()))
    }

    /// Whether captures of this type may contain `/`
    pub fn spans_separators(&self) -> bool {
        matches!(self, Self::Spanning)
    }

    /// Mini-pattern (regex syntax) describing the shape of a capture
    pub fn pattern(&self) -> String {
        match self {
            Self::Str => DEFAULT_PATTERN.to_string(),
            // The sign counts towards the width, as in `format!("{:03}", -1)`
            Self::Int {
                width: Some(width),
                zero_pad: true,
            } => {
                let signed = width.saturating_sub(1).max(1);
                format!(r"(?:\d{{{width},}}|-\d{{{signed},}})")
            }
            Self::Int {
                width: Some(_),
                zero_pad: false,
            } => r" *-?\d+".to_string(),
            Self::Int { width: None, .. } => r"-?\d+".to_string(),
            Self::Float {
                precision: Some(precision),
            } => format!(r"-?\d+\.\d{{{precision}}}"),
            Self::Float { precision: None } => {
                r"-?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][-+]?\d+)?".to_string()
            }
            Self::Date { format, .. } => date_format_pattern(format),
            Self::Custom(custom) => custom.pattern.clone(),
            Self::Pattern(pattern) => pattern.clone(),
            Self::Spanning => ".+".to_string(),
        }
    }

    /// Coerce captured text into a typed value
    ///
    /// Total-or-fail: either the whole text converts or an error reason is
    /// returned.
    pub fn coerce(&self, raw: &str) -> Result<FieldValue, String> {
        if !self.spans_separators() && raw.contains('/') {
            return Err("value spans a path separator".to_string());
        }

        match self {
            Self::Str | Self::Spanning if raw.is_empty() => Err("empty value".to_string()),
            Self::Str | Self::Pattern(_) | Self::Spanning => Ok(FieldValue::Str(raw.to_string())),
            Self::Int { width, zero_pad } => {
                if let Some(width) = width
                    && !zero_pad
                    && raw.chars().count() < *width
                {
                    return Err(format!("shorter than width {width}"));
                }
                raw.trim_start()
                    .parse::<i64>()
                    .map(FieldValue::Int)
                    .map_err(|e| e.to_string())
            }
            Self::Float { .. } => raw
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|e| e.to_string()),
            Self::Date { format, has_time } => parse_date(raw, format, *has_time),
            Self::Custom(custom) => (custom.coerce)(raw).map(|value| FieldValue::Custom {
                type_name: custom.name.clone(),
                value: Box::new(value),
            }),
        }
    }

    /// Format a value back into path text
    pub fn render(&self, name: &str, value: &FieldValue) -> Result<String, TemplateError> {
        let invalid = |reason: &str| TemplateError::InvalidFieldValue {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            Self::Str | Self::Pattern(_) | Self::Custom(_) | Self::Spanning => {
                Ok(value.to_string())
            }
            Self::Int { width, zero_pad } => {
                let number = match value.inner() {
                    FieldValue::Int(i) => *i,
                    FieldValue::Str(s) => s
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| invalid("expected an integer"))?,
                    _ => return Err(invalid("expected an integer")),
                };
                Ok(match (width, zero_pad) {
                    (Some(width), true) => format!("{number:0width$}"),
                    (Some(width), false) => format!("{number:>width$}"),
                    (None, _) => number.to_string(),
                })
            }
            Self::Float { precision } => {
                let number = match value.inner() {
                    FieldValue::Str(s) => s
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| invalid("expected a number"))?,
                    other => other.as_float().ok_or_else(|| invalid("expected a number"))?,
                };
                Ok(match precision {
                    Some(precision) => format!("{number:.precision$}"),
                    None => number.to_string(),
                })
            }
            Self::Date { format, .. } => match value.inner() {
                FieldValue::Date(date) => Ok(date.format(format).to_string()),
                FieldValue::DateTime(datetime) => Ok(datetime.format(format).to_string()),
                FieldValue::Str(s) => Ok(s.clone()),
                _ => Err(invalid("expected a date")),
            },
        }
    }
}

fn parse_int_spec(raw: &str) -> Option<TypeSpec> {
    let digits = raw.strip_suffix('d')?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let zero_pad = digits.len() > 1 && digits.starts_with('0') || digits == "0";
    let width_digits = if zero_pad { &digits[1..] } else { digits };
    let width = if width_digits.is_empty() {
        None
    } else {
        Some(width_digits.parse().ok()?)
    };

    Some(TypeSpec::Int { width, zero_pad })
}

fn parse_float_spec(raw: &str) -> Option<TypeSpec> {
    let head = raw.strip_suffix('f')?;
    if head.is_empty() {
        return Some(TypeSpec::Float { precision: None });
    }

    let precision = head.strip_prefix('.')?;
    if precision.is_empty() || !precision.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(TypeSpec::Float {
        precision: Some(precision.parse().ok()?),
    })
}

fn parse_date_spec(name: &str, raw: &str) -> Result<TypeSpec, TemplateError> {
    // Placeholders never span separators implicitly
    if raw.contains('/') || directives(raw).contains(&'D') {
        return Err(TemplateError::invalid_spec(
            name,
            raw,
            "date format may not contain a path separator",
        ));
    }

    let mut has_date = false;
    let mut has_time = false;

    for directive in directives(raw) {
        match directive {
            'Y' | 'y' | 'm' | 'd' | 'j' | 'b' | 'B' | 'h' | 'e' | 'F' => has_date = true,
            'H' | 'M' | 'S' | 'I' | 'p' | 'f' | 'T' | 'R' => has_time = true,
            'a' | 'A' | '%' => {}
            other => {
                return Err(TemplateError::invalid_spec(
                    name,
                    raw,
                    format!("unsupported date directive '%{other}'"),
                ));
            }
        }
    }

    if !has_date {
        return Err(TemplateError::invalid_spec(
            name,
            raw,
            "date format needs at least one date directive",
        ));
    }

    Ok(TypeSpec::Date {
        format: raw.to_string(),
        has_time,
    })
}

/// Directive letters of a strftime format, ignoring padding flags
fn directives(format: &str) -> Vec<char> {
    let mut found = Vec::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        let mut next = chars.next();
        while matches!(next, Some('-' | '_' | '0')) {
            next = chars.next();
        }
        if let Some(directive) = next {
            found.push(directive);
        }
    }
    found
}

fn date_format_pattern(format: &str) -> String {
    let mut pattern = String::new();
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            pattern.push_str(&regex::escape(&c.to_string()));
            continue;
        }

        let mut flagged = false;
        let mut next = chars.next();
        while matches!(next, Some('-' | '_' | '0')) {
            flagged = true;
            next = chars.next();
        }

        let piece = match next {
            Some(_) if flagged => r" *\d+",
            Some('Y') => r"\d{4}",
            Some('y' | 'm' | 'd' | 'H' | 'M' | 'S' | 'I') => r"\d{2}",
            Some('e') => r"[ \d]\d",
            Some('j') => r"\d{3}",
            Some('f') => r"\d+",
            Some('b' | 'h' | 'a') => r"[A-Za-z]{3}",
            Some('B' | 'A') => r"[A-Za-z]+",
            Some('p') => r"[AaPp][Mm]",
            Some('F') => r"\d{4}-\d{2}-\d{2}",
            Some('T') => r"\d{2}:\d{2}:\d{2}",
            Some('R') => r"\d{2}:\d{2}",
            Some('%') => "%",
            _ => "[^/]+?",
        };
        pattern.push_str(piece);
    }

    pattern
}

fn parse_date(raw: &str, format: &str, has_time: bool) -> Result<FieldValue, String> {
    if has_time {
        return NaiveDateTime::parse_from_str(raw, format)
            .map(FieldValue::DateTime)
            .map_err(|e| e.to_string());
    }

    // Formats such as `%Y` or `%Y%m` do not pin a day; default the missing
    // parts to 1.
    let found = directives(format);
    let mut format = format.to_string();
    let mut raw = raw.to_string();
    if !found.iter().any(|d| matches!(d, 'j' | 'F')) {
        if !found.iter().any(|d| matches!(d, 'm' | 'b' | 'B' | 'h')) {
            format.push_str("|%m");
            raw.push_str("|1");
        }
        if !found.iter().any(|d| matches!(d, 'd' | 'e')) {
            format.push_str("|%d");
            raw.push_str("|1");
        }
    }

    NaiveDate::parse_from_str(&raw, &format)
        .map(FieldValue::Date)
        .map_err(|e| e.to_string())
}
