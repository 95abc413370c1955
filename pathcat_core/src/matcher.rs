//! Path matcher: extract typed fields from a concrete path
//!
//! The template is split into units. Without separator-spanning placeholders
//! each path component is a unit matched in lock-step with the template's
//! components; otherwise the whole path is a single unit. Every unit is
//! handed to the segment matcher, captures are coerced per their type spec and
//! repeated fields are checked for equal values.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{MatchError, TemplateError};
use crate::segment::{CompiledSegment, MatchPart, RegexSegmentMatcher, SegmentMatcher};
use crate::template::{Component, Placeholder, Segment, Template};
use crate::value::FieldValue;

/// Outcome of matching one path against one template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchRecord {
    Success {
        path: String,
        /// Fields in first-appearance order, each name once
        #[serde(serialize_with = "serialize_fields")]
        fields: Vec<(String, FieldValue)>,
    },
    Failure {
        path: String,
        reason: MatchError,
    },
}

impl MatchRecord {
    pub fn path(&self) -> &str {
        match self {
            Self::Success { path, .. } | Self::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn fields(&self) -> Option<&[(String, FieldValue)]> {
        match self {
            Self::Success { fields, .. } => Some(fields),
            Self::Failure { .. } => None,
        }
    }

    /// Value of a field in a successful record
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields()?
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn reason(&self) -> Option<&MatchError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(reason),
        }
    }
}

fn serialize_fields<S: Serializer>(
    fields: &[(String, FieldValue)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (name, value) in fields {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

/// Compiled unit of a template
#[derive(Debug)]
struct Unit {
    parts: Vec<Segment>,
    source: String,
    compiled: Box<dyn CompiledSegment>,
}

impl Unit {
    fn compile(parts: Vec<Segment>, engine: &dyn SegmentMatcher) -> Result<Self, TemplateError> {
        let source = Component {
            parts: parts.clone(),
        }
        .source();

        let description: Vec<MatchPart> = parts
            .iter()
            .map(|part| match part {
                Segment::Literal(text) => MatchPart::Literal(text.clone()),
                Segment::Placeholder(p) => MatchPart::Capture(p.spec.pattern()),
            })
            .collect();

        let compiled = engine
            .compile(&description)
            .map_err(|reason| TemplateError::UnsupportedPattern {
                pattern: source.clone(),
                reason,
            })?;

        Ok(Self {
            parts,
            source,
            compiled,
        })
    }

    fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.parts.iter().filter_map(|part| match part {
            Segment::Placeholder(p) => Some(p),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the unit's literal text occurs in order in `text`, anchored at
    /// the ends where the unit starts or ends with a literal
    fn literals_align(&self, text: &str) -> bool {
        let mut rest = text;
        let last = self.parts.len().saturating_sub(1);

        for (index, part) in self.parts.iter().enumerate() {
            let Segment::Literal(literal) = part else {
                continue;
            };
            if index == 0 {
                match rest.strip_prefix(literal.as_str()) {
                    Some(tail) => rest = tail,
                    None => return false,
                }
            } else if index == last {
                match rest.strip_suffix(literal.as_str()) {
                    Some(head) => rest = head,
                    None => return false,
                }
            } else {
                match rest.find(literal.as_str()) {
                    Some(at) => rest = &rest[at + literal.len()..],
                    None => return false,
                }
            }
        }

        self.placeholders().next().is_some() || rest.is_empty()
    }
}

/// Matches concrete paths against one compiled template
///
/// Compiled once, then shared read-only. Matching never returns an error:
/// every problem ends up in a [`MatchRecord::Failure`].
#[derive(Debug)]
pub struct PathMatcher {
    template: Arc<Template>,
    units: Vec<Unit>,
    whole_path: bool,
}

impl PathMatcher {
    /// Build a matcher using the regex segment matcher
    pub fn new(template: impl Into<Arc<Template>>) -> Result<Self, TemplateError> {
        Self::with_segment_matcher(template, &RegexSegmentMatcher)
    }

    /// Build a matcher on a caller-supplied segment matcher
    pub fn with_segment_matcher(
        template: impl Into<Arc<Template>>,
        engine: &dyn SegmentMatcher,
    ) -> Result<Self, TemplateError> {
        let template = template.into();
        let whole_path = template.spans_separators();

        let units = if whole_path {
            vec![Unit::compile(template.segments().to_vec(), engine)?]
        } else {
            template
                .components()
                .into_iter()
                .map(|component| Unit::compile(component.parts, engine))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            template,
            units,
            whole_path,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Shared handle to the template
    pub fn template_arc(&self) -> Arc<Template> {
        Arc::clone(&self.template)
    }

    /// Match one path
    pub fn match_path(&self, path: &str) -> MatchRecord {
        let normalized = normalize_separators(path);
        match self.extract(&normalized) {
            Ok(fields) => MatchRecord::Success {
                path: path.to_string(),
                fields,
            },
            Err(reason) => MatchRecord::Failure {
                path: path.to_string(),
                reason,
            },
        }
    }

    fn extract(&self, path: &str) -> Result<Vec<(String, FieldValue)>, MatchError> {
        let texts: Vec<&str> = if self.whole_path {
            vec![path]
        } else {
            path.split('/').collect()
        };

        if texts.len() != self.units.len() {
            return Err(MatchError::StructureMismatch {
                expected: self.units.len(),
                found: texts.len(),
            });
        }

        // name -> (value, raw text it came from)
        let mut fields: Vec<(String, FieldValue, String)> = Vec::new();
        let mut first_error = None;

        if self.bind_units(&texts, 0, &mut fields, &mut first_error) {
            return Ok(fields
                .into_iter()
                .map(|(name, value, _)| (name, value))
                .collect());
        }
        Err(first_error.unwrap_or_else(|| MatchError::NoValidSplit {
            component: path.to_string(),
            pattern: self.template.source().to_string(),
        }))
    }

    /// Try the splits of unit `index` in greedy order, backtracking when a
    /// later unit cannot be bound. The first failure met is kept for reporting.
    fn bind_units(
        &self,
        texts: &[&str],
        index: usize,
        fields: &mut Vec<(String, FieldValue, String)>,
        first_error: &mut Option<MatchError>,
    ) -> bool {
        let (Some(unit), Some(text)) = (self.units.get(index), texts.get(index)) else {
            return true;
        };

        let mut offered = false;
        let mut bound = false;
        unit.compiled
            .for_each_split(text, &mut |captures: &[String]| {
                offered = true;
                let mark = fields.len();
                match bind_captures(unit, captures, fields) {
                    Ok(()) if self.bind_units(texts, index + 1, fields, first_error) => {
                        bound = true;
                        return true;
                    }
                    Ok(()) => {}
                    Err(error) => {
                        first_error.get_or_insert(error);
                    }
                }
                fields.truncate(mark);
                false
            });

        if !offered {
            first_error.get_or_insert(if unit.literals_align(text) {
                MatchError::NoValidSplit {
                    component: text.to_string(),
                    pattern: unit.source.clone(),
                }
            } else {
                MatchError::LiteralMismatch {
                    component: text.to_string(),
                    pattern: unit.source.clone(),
                }
            });
        }
        bound
    }
}

/// Coerce one split of a unit and check repeated fields against those bound
/// so far. New fields are appended to `fields`.
fn bind_captures(
    unit: &Unit,
    captures: &[String],
    fields: &mut Vec<(String, FieldValue, String)>,
) -> Result<(), MatchError> {
    for (placeholder, raw) in unit.placeholders().zip(captures) {
        let value = placeholder
            .spec
            .coerce(raw)
            .map_err(|reason| MatchError::Coercion {
                field: placeholder.name.clone(),
                raw: raw.clone(),
                reason,
            })?;

        match fields.iter().find(|(name, _, _)| *name == placeholder.name) {
            Some((_, first, first_raw)) if *first != value => {
                return Err(MatchError::InconsistentFieldValue {
                    name: placeholder.name.clone(),
                    first: first_raw.clone(),
                    second: raw.clone(),
                });
            }
            Some(_) => {}
            None => fields.push((placeholder.name.clone(), value, raw.clone())),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn normalize_separators(path: &str) -> Cow<'_, str> {
    Cow::Owned(path.replace('\\', "/"))
}

#[cfg(not(windows))]
fn normalize_separators(path: &str) -> Cow<'_, str> {
    Cow::Borrowed(path)
}
