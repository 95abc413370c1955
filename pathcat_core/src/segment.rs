//! Segment matching capability
//!
//! The path matcher does not match text itself. It describes each unit of a
//! template as literal and capture parts, and hands that description to a
//! [`SegmentMatcher`], which returns the ordered captures or fails.

use regex::Regex;
use std::fmt;

/// One part of a unit handed to a segment matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPart {
    /// Text that must appear verbatim
    Literal(String),
    /// A capture with its mini-pattern (regex syntax)
    Capture(String),
}

/// Compiles unit descriptions into matchers
pub trait SegmentMatcher: Send + Sync {
    /// Compile the parts of a unit
    ///
    /// The compiled matcher must be anchored on both ends and split ambiguous
    /// captures greedily from left to right.
    fn compile(&self, parts: &[MatchPart]) -> Result<Box<dyn CompiledSegment>, String>;
}

/// A compiled unit
pub trait CompiledSegment: Send + Sync + fmt::Debug {
    /// Match the whole text, returning one capture per `Capture` part in order
    fn captures(&self, text: &str) -> Option<Vec<String>>;

    /// Offer every split of the text to `visit`, greedy splits first
    ///
    /// Enumeration stops as soon as `visit` returns `true`. The default offers
    /// only the split returned by [`captures`](Self::captures).
    fn for_each_split(&self, text: &str, visit: &mut dyn FnMut(&[String]) -> bool) {
        if let Some(captures) = self.captures(text) {
            visit(&captures);
        }
    }

    /// Pattern text, for diagnostics
    fn pattern(&self) -> &str;
}

/// Default segment matcher backed by the `regex` crate
///
/// Leftmost-first alternation semantics make greedy captures win ties in
/// template order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSegmentMatcher;

impl SegmentMatcher for RegexSegmentMatcher {
    fn compile(&self, parts: &[MatchPart]) -> Result<Box<dyn CompiledSegment>, String> {
        let mut pattern = String::from("^");
        let mut groups = 0usize;

        for part in parts {
            match part {
                MatchPart::Literal(text) => pattern.push_str(&regex::escape(text)),
                MatchPart::Capture(sub) => {
                    pattern.push_str(&format!("(?P<c{groups}>{sub})"));
                    groups += 1;
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| e.to_string())?;
        let pieces = parts
            .iter()
            .map(|part| match part {
                MatchPart::Literal(text) => Ok(Piece::Literal(text.clone())),
                MatchPart::Capture(sub) => Regex::new(&format!("^(?:{sub})$"))
                    .map(Piece::Capture)
                    .map_err(|e| e.to_string()),
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Box::new(RegexSegment {
            regex,
            pieces,
            groups,
            pattern,
        }))
    }
}

/// Upper bound on the splits offered for one text
const MAX_SPLITS: usize = 4096;

#[derive(Debug)]
enum Piece {
    Literal(String),
    /// Capture pattern anchored on both ends
    Capture(Regex),
}

#[derive(Debug)]
struct RegexSegment {
    regex: Regex,
    pieces: Vec<Piece>,
    groups: usize,
    pattern: String,
}

impl RegexSegment {
    /// Depth-first walk over the pieces, longest capture first.
    /// Returns `true` once enumeration must stop.
    fn walk(
        &self,
        text: &str,
        piece: usize,
        pos: usize,
        captures: &mut Vec<String>,
        budget: &mut usize,
        visit: &mut dyn FnMut(&[String]) -> bool,
    ) -> bool {
        let Some(current) = self.pieces.get(piece) else {
            if pos != text.len() {
                return false;
            }
            *budget = budget.saturating_sub(1);
            return visit(captures.as_slice()) || *budget == 0;
        };

        match current {
            Piece::Literal(literal) => {
                if text[pos..].starts_with(literal.as_str()) {
                    self.walk(text, piece + 1, pos + literal.len(), captures, budget, visit)
                } else {
                    false
                }
            }
            Piece::Capture(regex) => {
                for end in (pos..=text.len()).rev() {
                    if !text.is_char_boundary(end) || !regex.is_match(&text[pos..end]) {
                        continue;
                    }
                    captures.push(text[pos..end].to_string());
                    let stop = self.walk(text, piece + 1, end, captures, budget, visit);
                    captures.pop();
                    if stop {
                        return true;
                    }
                }
                false
            }
        }
    }
}

impl CompiledSegment for RegexSegment {
    fn captures(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(text)?;
        (0..self.groups)
            .map(|index| {
                caps.name(&format!("c{index}"))
                    .map(|m| m.as_str().to_string())
            })
            .collect()
    }

    fn for_each_split(&self, text: &str, visit: &mut dyn FnMut(&[String]) -> bool) {
        if !self.regex.is_match(text) {
            return;
        }
        let mut captures = Vec::with_capacity(self.groups);
        let mut budget = MAX_SPLITS;
        self.walk(text, 0, 0, &mut captures, &mut budget, visit);
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }
}
