//! Path templates
//!
//! A template is literal text interspersed with named placeholders, e.g.
//! `{site}/{year:d}/data_{month:02d}.csv`. Compiling one yields an immutable
//! [`Template`] that the traversal pattern generator and the path matcher
//! share read-only.

mod cache;
mod glob;
mod parser;
mod spec;

pub use cache::{TemplateCache, TemplateCacheStats};
pub use glob::TraversalPattern;
pub use parser::RESERVED_NAMES;
pub use spec::{CoerceFn, CustomType, CustomTypeRegistry, SPANNING_SPEC, TypeSpec};

use crate::error::TemplateError;
use crate::value::FieldValue;
use std::collections::HashMap;
use std::fmt;

/// Named slot of a template
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub name: String,
    pub spec: TypeSpec,
    /// Spec text as written, `None` for `{name}`
    pub raw_spec: Option<String>,
}

impl Placeholder {
    /// Placeholder written back in template syntax
    pub fn source(&self) -> String {
        match &self.raw_spec {
            Some(spec) => format!("{{{}:{}}}", self.name, spec),
            None => format!("{{{}}}", self.name),
        }
    }
}

/// Piece of a compiled template
#[derive(Debug, Clone)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Segments between two path separators
#[derive(Debug, Clone, Default)]
pub struct Component {
    pub parts: Vec<Segment>,
}

impl Component {
    pub fn has_placeholder(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Segment::Placeholder(_)))
    }

    pub fn spans_separators(&self) -> bool {
        self.parts.iter().any(
            |part| matches!(part, Segment::Placeholder(p) if p.spec.spans_separators()),
        )
    }

    /// Literal pieces in order
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Segment::Literal(text) => Some(text.as_str()),
            Segment::Placeholder(_) => None,
        })
    }

    /// Component written back in template syntax
    pub fn source(&self) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                Segment::Literal(text) => text.replace('{', "{{").replace('}', "}}"),
                Segment::Placeholder(p) => p.source(),
            })
            .collect()
    }
}

/// Compiled path template
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    keys: Vec<String>,
}

impl Template {
    /// Compile a template with no custom types
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        parser::compile(source, &CustomTypeRegistry::new())
    }

    /// Compile a template resolving custom type specs from `registry`
    pub fn compile_with(source: &str, registry: &CustomTypeRegistry) -> Result<Self, TemplateError> {
        parser::compile(source, registry)
    }

    pub(crate) fn from_segments(source: &str, segments: Vec<Segment>) -> Self {
        let mut keys: Vec<String> = Vec::new();
        for segment in &segments {
            if let Segment::Placeholder(p) = segment
                && !keys.contains(&p.name)
            {
                keys.push(p.name.clone());
            }
        }

        Self {
            source: source.to_string(),
            segments,
            keys,
        }
    }

    /// Template string as given to the compiler
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Unique placeholder names in first-appearance order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Every placeholder occurrence, repeats included
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(p) => Some(p),
            Segment::Literal(_) => None,
        })
    }

    /// First occurrence of a placeholder
    pub fn placeholder(&self, name: &str) -> Option<&Placeholder> {
        self.placeholders().find(|p| p.name == name)
    }

    pub fn is_absolute(&self) -> bool {
        self.source.starts_with('/')
    }

    /// Templates ending in `/` describe directories
    pub fn is_directory(&self) -> bool {
        self.source.ends_with('/')
    }

    /// Whether any placeholder may cross path separators
    pub fn spans_separators(&self) -> bool {
        self.placeholders().any(|p| p.spec.spans_separators())
    }

    /// Split the template at `/` into path components
    ///
    /// An absolute template starts with an empty component and a directory
    /// template ends with one, mirroring `str::split('/')` on concrete paths.
    pub fn components(&self) -> Vec<Component> {
        let mut components = vec![Component::default()];

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    let mut pieces = text.split('/');
                    if let Some(first) = pieces.next()
                        && !first.is_empty()
                        && let Some(current) = components.last_mut()
                    {
                        current.parts.push(Segment::Literal(first.to_string()));
                    }
                    for piece in pieces {
                        let mut component = Component::default();
                        if !piece.is_empty() {
                            component.parts.push(Segment::Literal(piece.to_string()));
                        }
                        components.push(component);
                    }
                }
                Segment::Placeholder(p) => {
                    if let Some(current) = components.last_mut() {
                        current.parts.push(Segment::Placeholder(p.clone()));
                    }
                }
            }
        }

        components
    }

    /// Number of leading components made only of literal text
    pub fn static_prefix_len(&self) -> usize {
        let components = self.components();
        let last = components.len().saturating_sub(1);
        components
            .iter()
            .take(last)
            .take_while(|component| !component.has_placeholder())
            .count()
    }

    /// Fill the template with field values, producing a concrete path
    pub fn render(&self, fields: &HashMap<String, FieldValue>) -> Result<String, TemplateError> {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(p) => {
                    let value = fields
                        .get(&p.name)
                        .ok_or_else(|| TemplateError::missing_field(&p.name))?;
                    rendered.push_str(&p.spec.render(&p.name, value)?);
                }
            }
        }
        Ok(rendered)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, FieldValue)]) -> HashMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_components_split_literals() {
        let template = Template::compile("{site}/{year:d}/data_{month:02d}.csv").unwrap();
        let sources: Vec<_> = template.components().iter().map(Component::source).collect();
        assert_eq!(sources, vec!["{site}", "{year:d}", "data_{month:02d}.csv"]);
    }

    #[test]
    fn test_components_absolute_and_directory() {
        let template = Template::compile("/data/{model}/").unwrap();
        assert!(template.is_absolute());
        assert!(template.is_directory());

        let sources: Vec<_> = template.components().iter().map(Component::source).collect();
        assert_eq!(sources, vec!["", "data", "{model}", ""]);
        assert_eq!(template.static_prefix_len(), 2);
    }

    #[test]
    fn test_render_formats_types() {
        let template = Template::compile("{site}/{year:d}/data_{month:02d}.csv").unwrap();
        let rendered = template
            .render(&fields(&[
                ("site", FieldValue::from("A")),
                ("year", FieldValue::Int(2020)),
                ("month", FieldValue::Int(1)),
            ]))
            .unwrap();
        assert_eq!(rendered, "A/2020/data_01.csv");
    }

    #[test]
    fn test_render_missing_field() {
        let template = Template::compile("{a}/{b}").unwrap();
        let err = template
            .render(&fields(&[("a", FieldValue::from("x"))]))
            .unwrap_err();
        assert_eq!(err, TemplateError::missing_field("b"));
    }

    #[test]
    fn test_spanning_detection() {
        assert!(Template::compile("{root:**}/file").unwrap().spans_separators());
        assert!(!Template::compile("{root}/file").unwrap().spans_separators());
    }

    #[test]
    fn test_date_placeholder_cannot_hold_separator() {
        let err = Template::compile("{d:%Y/%m}/x.nc").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTypeSpec { .. }));
    }
}
