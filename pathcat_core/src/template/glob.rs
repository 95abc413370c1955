//! Traversal patterns derived from templates
//!
//! Each placeholder becomes `*` within its path component; a component holding
//! a separator-spanning placeholder becomes `**`. Literal text is escaped so
//! glob metacharacters in file names match literally. The pattern is a
//! superset filter: it may admit paths the matcher later rejects, never the
//! other way round.

use globset::{GlobBuilder, GlobMatcher};
use std::fmt;

use super::{Segment, Template};
use crate::error::TemplateError;

/// Characters with meaning in glob syntax
const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}', '!', '\\'];

/// Matcher for one path component of a traversal pattern
#[derive(Debug, Clone)]
enum ComponentGlob {
    Exact(GlobMatcher),
    /// `**`: zero or more whole components
    Recursive,
}

/// Glob pattern used to prune a filesystem walk
#[derive(Debug, Clone)]
pub struct TraversalPattern {
    glob: String,
    components: Vec<ComponentGlob>,
    full: GlobMatcher,
    absolute: bool,
    directory: bool,
}

impl TraversalPattern {
    /// Derive the traversal pattern of a compiled template
    pub fn from_template(template: &Template) -> Result<Self, TemplateError> {
        let mut pieces: Vec<String> = Vec::new();
        let mut components = template.components();

        let absolute = template.is_absolute();
        if absolute && !components.is_empty() {
            components.remove(0);
        }
        let directory = template.is_directory();
        if directory {
            components.pop();
        }

        for component in &components {
            let piece = if component.spans_separators() {
                "**".to_string()
            } else {
                component_glob(&component.parts)
            };
            if piece == "**" && pieces.last().is_some_and(|last| last == "**") {
                continue;
            }
            pieces.push(piece);
        }

        let glob = assemble(&pieces, absolute, directory);
        Self::build(glob, pieces, absolute, directory)
    }

    /// Compile an arbitrary glob string into a traversal pattern
    ///
    /// A leading `/` marks an absolute pattern and a trailing `/` a pattern
    /// for directories, as with templates.
    pub fn parse(glob: &str) -> Result<Self, TemplateError> {
        let absolute = glob.starts_with('/');
        let directory = glob.len() > 1 && glob.ends_with('/');
        let body = glob.trim_start_matches('/').trim_end_matches('/');

        let pieces = if body.is_empty() {
            Vec::new()
        } else {
            split_components(body)
        };
        Self::build(glob.to_string(), pieces, absolute, directory)
    }

    fn build(
        glob: String,
        pieces: Vec<String>,
        absolute: bool,
        directory: bool,
    ) -> Result<Self, TemplateError> {
        let invalid = |reason: String| TemplateError::InvalidGlob {
            glob: glob.clone(),
            reason,
        };

        let mut components = Vec::with_capacity(pieces.len());
        for piece in &pieces {
            // Braces may hide separators; treat such components as recursive
            if piece == "**" || piece.contains('/') {
                components.push(ComponentGlob::Recursive);
            } else {
                components.push(ComponentGlob::Exact(
                    compile_glob(piece).map_err(&invalid)?,
                ));
            }
        }
        let full = compile_glob(&pieces.join("/")).map_err(&invalid)?;

        Ok(Self {
            glob,
            components,
            full,
            absolute,
            directory,
        })
    }

    /// Glob string, e.g. `*/*/data_*.csv`
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Whether the pattern is matched against absolute paths
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Whether the pattern selects directories instead of files
    pub fn is_directory(&self) -> bool {
        self.directory
    }

    /// Whether the pattern crosses separators anywhere
    pub fn is_recursive(&self) -> bool {
        self.components
            .iter()
            .any(|component| matches!(component, ComponentGlob::Recursive))
    }

    /// Number of path components a match spans, ignoring recursion
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Whether a directory may hold matching paths below it
    ///
    /// `dir` is relative to the crawl root, or absolute for absolute patterns.
    /// Used to prune the walk: `false` means no descendant can match.
    pub fn could_contain(&self, dir: &str) -> bool {
        let dir = self.strip_key(dir);
        if dir.is_empty() {
            return true;
        }

        for (index, name) in dir.split('/').enumerate() {
            match self.components.get(index) {
                None => return false,
                Some(ComponentGlob::Recursive) => return true,
                Some(ComponentGlob::Exact(matcher)) => {
                    if !matcher.is_match(name) {
                        return false;
                    }
                }
            }
        }

        dir.split('/').count() < self.components.len()
    }

    /// Whether a path matches the whole pattern
    pub fn matches(&self, path: &str) -> bool {
        self.full.is_match(self.strip_key(path))
    }

    fn strip_key<'a>(&self, key: &'a str) -> &'a str {
        let key = if self.absolute {
            key.trim_start_matches('/')
        } else {
            key
        };
        key.trim_end_matches('/')
    }
}

impl fmt::Display for TraversalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

/// Glob text for a component without spanning placeholders
fn component_glob(parts: &[Segment]) -> String {
    let mut glob = String::new();
    let mut after_wildcard = false;

    for part in parts {
        match part {
            Segment::Literal(text) => {
                glob.push_str(&escape(text));
                after_wildcard = false;
            }
            Segment::Placeholder(_) => {
                if !after_wildcard {
                    glob.push('*');
                }
                after_wildcard = true;
            }
        }
    }

    glob
}

/// Escape glob metacharacters in literal text
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if GLOB_META.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn assemble(pieces: &[String], absolute: bool, directory: bool) -> String {
    let mut glob = String::new();
    if absolute {
        glob.push('/');
    }
    glob.push_str(&pieces.join("/"));
    if directory && !glob.ends_with('/') {
        glob.push('/');
    }
    glob
}

/// Split a glob at separators outside braces and brackets
fn split_components(glob: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut braces = 0usize;
    let mut in_class = false;
    let mut chars = glob.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                continue;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => braces += 1,
            '}' if !in_class => braces = braces.saturating_sub(1),
            '/' if braces == 0 && !in_class => {
                components.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    components.push(current);

    components
}

fn compile_glob(glob: &str) -> Result<GlobMatcher, String> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(template: &str) -> TraversalPattern {
        TraversalPattern::from_template(&Template::compile(template).unwrap()).unwrap()
    }

    #[test]
    fn test_placeholders_become_wildcards() {
        let glob = pattern("{site}/{year:d}/data_{month:02d}.csv");
        assert_eq!(glob.as_str(), "*/*/data_*.csv");
        assert!(glob.matches("A/2020/data_01.csv"));
        assert!(!glob.matches("B/notes.txt"));
    }

    #[test]
    fn test_adjacent_placeholders_collapse() {
        assert_eq!(pattern("{a}{b}_{c}.nc").as_str(), "*_*.nc");
    }

    #[test]
    fn test_literals_escaped() {
        let glob = pattern("raw[1]/{name}*.txt");
        assert_eq!(glob.as_str(), r"raw\[1\]/*\*.txt");
        assert!(glob.matches("raw[1]/a*.txt"));
        assert!(!glob.matches("raw1/a*.txt"));
        assert!(!glob.matches("raw[1]/a.txt"));
    }

    #[test]
    fn test_spanning_placeholder_is_recursive() {
        let glob = pattern("{root:**}/{tail:**}/data_{x}.nc");
        assert_eq!(glob.as_str(), "**/data_*.nc");
        assert!(glob.is_recursive());
        assert!(glob.matches("a/b/c/data_1.nc"));
        assert!(glob.could_contain("a/b/c/d"));
    }

    #[test]
    fn test_could_contain_prunes() {
        let glob = pattern("{site}/{year:d}/data_{month:02d}.csv");
        assert!(glob.could_contain(""));
        assert!(glob.could_contain("A"));
        assert!(glob.could_contain("A/2020"));
        assert!(!glob.could_contain("A/2020/deeper"));

        let fixed = pattern("obs/{site}/{name}.csv");
        assert!(fixed.could_contain("obs"));
        assert!(!fixed.could_contain("model"));
    }

    #[test]
    fn test_absolute_and_directory_templates() {
        let glob = pattern("/data/{model}/");
        assert_eq!(glob.as_str(), "/data/*/");
        assert!(glob.is_absolute());
        assert!(glob.is_directory());
        assert!(glob.matches("/data/cesm/"));
        assert!(glob.could_contain("/data"));
        assert!(!glob.could_contain("/tmp"));
    }

    #[test]
    fn test_parse_arbitrary_glob() {
        let glob = TraversalPattern::parse("*/{a,b/c}/*.nc").unwrap();
        assert_eq!(glob.depth(), 3);
        assert!(glob.is_recursive());
        assert!(glob.matches("x/a/y.nc"));

        let err = TraversalPattern::parse("a/[z").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidGlob { .. }));
    }
}
