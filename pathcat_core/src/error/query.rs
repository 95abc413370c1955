//! Catalog query errors

use thiserror::Error;

/// Errors raised by catalog queries and finder lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Field not present in the catalog's column set
    #[error("Unknown field '{field}'; available fields: {available}")]
    UnknownField { field: String, available: String },

    /// Combine was asked to join catalogs with no common field
    #[error("Catalogs share no fields to combine on")]
    NoSharedFields,

    /// Two rows carry identical values for every field
    #[error("Non-unique metadata detected for paths '{first}' and '{second}'")]
    NonUniqueMetadata { first: String, second: String },

    /// Lookup produced no rows
    #[error("Found no files matching criteria. Please verify that the criteria are correct")]
    Empty,

    /// Single lookup produced several rows
    #[error("Found more than one ({count}) files/ paths. Please adjust your criteria")]
    MoreThanOne { count: usize },

    /// Path could not be parsed and the caller asked for that to be fatal
    #[error("Could not parse '{path}' with the pattern '{template}': {reason}")]
    Unparsable {
        path: String,
        template: String,
        reason: String,
    },

    /// Invalid option value passed by the caller
    #[error("Unknown value for '{option}': '{value}'. Must be one of {allowed}.")]
    InvalidOption {
        option: String,
        value: String,
        allowed: String,
    },

    /// Explicit path list given to a finder contains duplicates
    #[error("`test_paths` are not unique: '{path}' appears more than once")]
    DuplicatePaths { path: String },
}

impl QueryError {
    /// Create an unknown field error listing what is available
    pub fn unknown_field(field: &str, available: &[impl AsRef<str>]) -> Self {
        let available = available
            .iter()
            .map(|name| format!("'{}'", name.as_ref()))
            .collect::<Vec<_>>()
            .join(", ");

        Self::UnknownField {
            field: field.to_string(),
            available,
        }
    }

    /// Create an invalid option error
    pub fn invalid_option(option: &str, value: &str, allowed: &[&str]) -> Self {
        let allowed = match allowed {
            [] => String::new(),
            [only] => format!("'{only}'"),
            [init @ .., last] => {
                let head = init
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{head} or '{last}'")
            }
        };

        Self::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_lists_available() {
        let error = QueryError::unknown_field("month", &["site", "year"]);
        assert_eq!(
            error.to_string(),
            "Unknown field 'month'; available fields: 'site', 'year'"
        );
    }

    #[test]
    fn test_invalid_option_message() {
        let error = QueryError::invalid_option("on_empty", "null", &["raise", "warn", "allow"]);
        assert_eq!(
            error.to_string(),
            "Unknown value for 'on_empty': 'null'. Must be one of 'raise', 'warn' or 'allow'."
        );
    }

    #[test]
    fn test_more_than_one_message() {
        let error = QueryError::MoreThanOne { count: 2 };
        assert!(error.to_string().contains("Found more than one (2) files/ paths"));
    }
}
