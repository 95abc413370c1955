//! Match-time failure reasons
//!
//! These are stored inside `MatchRecord::Failure` and never returned as `Err`.

use serde::Serialize;
use thiserror::Error;

/// Why a concrete path did not match a template
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchError {
    /// Literals line up but the placeholders cannot be split into valid spans
    #[error("No valid split of '{component}' for '{pattern}'")]
    NoValidSplit { component: String, pattern: String },

    /// A repeated field captured two different values
    #[error("Field '{name}' has inconsistent values '{first}' and '{second}'")]
    InconsistentFieldValue {
        name: String,
        first: String,
        second: String,
    },

    /// A captured span does not coerce to the declared type
    #[error("Cannot coerce '{raw}' for field '{field}': {reason}")]
    Coercion {
        field: String,
        raw: String,
        reason: String,
    },

    /// Literal text of the template is absent from the path
    #[error("Literal mismatch in '{component}' for '{pattern}'")]
    LiteralMismatch { component: String, pattern: String },

    /// The path has a different number of components than the template
    #[error("Expected {expected} path components, found {found}")]
    StructureMismatch { expected: usize, found: usize },

    /// Multi-template build: no template accepted the path
    #[error("No template matched: {first_reason}")]
    NoTemplateMatched { first_reason: String },
}

impl MatchError {
    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoValidSplit { .. } => "no_valid_split",
            Self::InconsistentFieldValue { .. } => "inconsistent_field_value",
            Self::Coercion { .. } => "coercion",
            Self::LiteralMismatch { .. } => "literal_mismatch",
            Self::StructureMismatch { .. } => "structure_mismatch",
            Self::NoTemplateMatched { .. } => "no_template_matched",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let error = MatchError::StructureMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(error.kind(), "structure_mismatch");
        assert_eq!(error.to_string(), "Expected 3 path components, found 2");
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let error = MatchError::Coercion {
            field: "month".to_string(),
            raw: "1x".to_string(),
            reason: "invalid digit".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "coercion");
        assert_eq!(json["field"], "month");
    }
}
