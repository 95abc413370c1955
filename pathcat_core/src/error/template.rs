//! Template compilation and rendering errors

use thiserror::Error;

/// Errors raised while compiling or rendering a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Unbalanced or unterminated placeholder delimiters
    #[error("Malformed template at position {position}: {message}")]
    MalformedTemplate { position: usize, message: String },

    /// A placeholder name reused with two different type specs
    #[error(
        "Placeholder '{name}' is declared with inconsistent types: '{first}' and '{second}'"
    )]
    InconsistentPlaceholderType {
        name: String,
        first: String,
        second: String,
    },

    /// Empty, positional or otherwise non-identifier placeholder name
    #[error("Invalid placeholder name '{name}' at position {position}: only named fields are allowed")]
    InvalidPlaceholderName { name: String, position: usize },

    /// Placeholder name collides with a reserved catalog column
    #[error("'{name}' is not a valid placeholder: the name is reserved")]
    ReservedPlaceholderName { name: String },

    /// Type spec that cannot be turned into a matcher
    #[error("Invalid type spec '{spec}' for placeholder '{name}': {reason}")]
    InvalidTypeSpec {
        name: String,
        spec: String,
        reason: String,
    },

    /// Glob string that cannot be compiled into a traversal pattern
    #[error("Invalid traversal pattern '{glob}': {reason}")]
    InvalidGlob { glob: String, reason: String },

    /// Segment matcher rejected a compiled component pattern
    #[error("Segment matcher cannot compile '{pattern}': {reason}")]
    UnsupportedPattern { pattern: String, reason: String },

    /// Rendering was asked for a field without a value
    #[error("Missing value for field '{name}'")]
    MissingField { name: String },

    /// Rendering was given a value that does not fit the placeholder
    #[error("Value '{value}' does not fit field '{name}': {reason}")]
    InvalidFieldValue {
        name: String,
        value: String,
        reason: String,
    },
}

impl TemplateError {
    /// Create a malformed template error
    pub fn malformed(position: usize, message: &str) -> Self {
        Self::MalformedTemplate {
            position,
            message: message.to_string(),
        }
    }

    /// Create an inconsistent placeholder type error
    pub fn inconsistent_type(name: &str, first: &str, second: &str) -> Self {
        Self::InconsistentPlaceholderType {
            name: name.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Create an invalid type spec error
    pub fn invalid_spec(name: &str, spec: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTypeSpec {
            name: name.to_string(),
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(name: &str) -> Self {
        Self::MissingField {
            name: name.to_string(),
        }
    }
}
