//! pathcat core library
//!
//! Compiles path templates such as `{site}/{year:d}/data_{month:02d}.csv`
//! into a traversal pattern and a path matcher, crawls a directory tree with
//! early pruning, and collects the typed fields of every matching path into a
//! queryable [`Catalog`].

pub mod catalog;
pub mod crawler;
pub mod error;
pub mod finder;
pub mod matcher;
pub mod segment;
pub mod template;
pub mod value;

// Re-export main types
pub use catalog::{
    BuildReport, Catalog, CatalogBuilder, CatalogEntry, CatalogRow, CatalogTable, Criteria,
    PATH_COLUMN,
};
pub use crawler::{Candidate, CrawlOptions, Crawler, TraversalWarning, WarningKind};
pub use error::{Error, IoError, MatchError, QueryError, Result, TemplateError};
pub use finder::{FindOptions, Finder, OnEmpty, OnParseError};
pub use matcher::{MatchRecord, PathMatcher};
pub use segment::{CompiledSegment, MatchPart, RegexSegmentMatcher, SegmentMatcher};
pub use template::{
    CustomType, CustomTypeRegistry, Placeholder, Segment, Template, TemplateCache,
    TraversalPattern, TypeSpec,
};
pub use value::FieldValue;
