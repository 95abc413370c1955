//! Error types for the pathcat core library
//!
//! Errors are grouped by the stage that raises them. Compile-time template
//! errors and query errors are returned through [`Result`]; match-time
//! problems are plain data ([`MatchError`]) stored in failure records and are
//! never propagated.

use thiserror::Error;

pub mod io;
pub mod matching;
pub mod query;
pub mod template;

pub use self::io::{IoError, IoErrorKind};
pub use self::matching::MatchError;
pub use self::query::QueryError;
pub use self::template::TemplateError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pathcat core library
///
/// - Template errors: the template string cannot be compiled or rendered
/// - Query errors: a catalog operation was asked something it cannot answer
/// - I/O errors: the crawl root itself is unusable
#[derive(Error, Debug)]
pub enum Error {
    /// Template compilation or rendering errors
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Catalog query errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Filesystem errors that are fatal to a build
    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl Error {
    /// Whether this error came from compiling or rendering a template
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template(_))
    }

    /// Whether this error came from a catalog query
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}
