//! Template string compiler
//!
//! Parses `{name}` / `{name:spec}` placeholders out of literal text, left to
//! right. `{{` and `}}` stand for literal braces. Specs may nest one level of
//! braces so regex quantifiers such as `{name:\d{4}}` survive.

use super::spec::{CustomTypeRegistry, TypeSpec};
use super::{Placeholder, Segment, Template};
use crate::error::TemplateError;
use std::collections::HashMap;

/// Placeholder names that collide with catalog columns
pub const RESERVED_NAMES: &[&str] = &["path"];

/// Compile a template string into its segments
pub fn compile(source: &str, registry: &CustomTypeRegistry) -> Result<Template, TemplateError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    // name -> (canonical spec, raw spec for messages)
    let mut declared: HashMap<String, (String, String)> = HashMap::new();
    let mut pos = 0;

    while pos < chars.len() {
        let (offset, c) = chars[pos];
        let next = chars.get(pos + 1).map(|(_, c)| *c);

        match (c, next) {
            ('{', Some('{')) => {
                literal.push('{');
                pos += 2;
            }
            ('}', Some('}')) => {
                literal.push('}');
                pos += 2;
            }
            ('}', _) => {
                return Err(TemplateError::malformed(
                    offset,
                    "single '}' encountered in template",
                ));
            }
            ('{', _) => {
                let close = find_closing(&chars, pos).ok_or_else(|| {
                    TemplateError::malformed(offset, "unterminated placeholder")
                })?;
                let body: String = chars[pos + 1..close].iter().map(|(_, c)| *c).collect();
                let placeholder = parse_placeholder(&body, offset, registry)?;

                let canonical = canonical_spec(&placeholder);
                let shown = placeholder.raw_spec.clone().unwrap_or_default();
                match declared.get(&placeholder.name) {
                    Some((first, first_shown)) if *first != canonical => {
                        return Err(TemplateError::inconsistent_type(
                            &placeholder.name,
                            first_shown,
                            &shown,
                        ));
                    }
                    Some(_) => {}
                    None => {
                        declared.insert(placeholder.name.clone(), (canonical, shown));
                    }
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(placeholder));
                pos = close + 1;
            }
            _ => {
                literal.push(c);
                pos += 1;
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(Template::from_segments(source, segments))
}

/// Index of the `}` closing the placeholder opened at `open`
fn find_closing(chars: &[(usize, char)], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, (_, c)) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_placeholder(
    body: &str,
    offset: usize,
    registry: &CustomTypeRegistry,
) -> Result<Placeholder, TemplateError> {
    let (name, raw_spec) = match body.split_once(':') {
        Some((name, spec)) => (name.trim(), Some(spec)),
        None => (body.trim(), None),
    };

    if !is_valid_name(name) {
        return Err(TemplateError::InvalidPlaceholderName {
            name: name.to_string(),
            position: offset,
        });
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(TemplateError::ReservedPlaceholderName {
            name: name.to_string(),
        });
    }

    let spec = TypeSpec::parse(name, raw_spec, registry)?;

    Ok(Placeholder {
        name: name.to_string(),
        spec,
        raw_spec: raw_spec.map(str::to_string),
    })
}

/// Identifier starting with a letter; leading underscores are rejected
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Spec text used for the repeated-name consistency check
fn canonical_spec(placeholder: &Placeholder) -> String {
    match (&placeholder.spec, placeholder.raw_spec.as_deref()) {
        (TypeSpec::Str, _) => String::new(),
        (_, Some(raw)) => raw.to_string(),
        (_, None) => String::new(),
    }
}
