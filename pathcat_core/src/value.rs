//! Typed field values extracted from paths

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A typed value captured by a placeholder
///
/// The variant is decided by the placeholder's type spec at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Value produced by a user-registered coercion
    Custom {
        type_name: String,
        value: Box<FieldValue>,
    },
}

impl FieldValue {
    /// Name of the value's type, as shown in diagnostics
    pub fn type_name(&self) -> &str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Custom { type_name, .. } => type_name,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Custom { value, .. } => value.as_str(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Custom { value, .. } => value.as_int(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::Custom { value, .. } => value.as_float(),
            _ => None,
        }
    }

    /// Strip any custom wrapper
    pub fn inner(&self) -> &FieldValue {
        match self {
            Self::Custom { value, .. } => value.inner(),
            other => other,
        }
    }

    /// Total order used for sorting catalogs
    ///
    /// Numbers compare numerically across `Int`/`Float`, dates chronologically;
    /// values of unrelated types fall back to their rendered text.
    pub fn total_cmp(&self, other: &FieldValue) -> Ordering {
        match (self.inner(), other.inner()) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Date(a), Self::DateTime(b)) => a.and_hms_opt(0, 0, 0).cmp(&Some(*b)),
            (Self::DateTime(a), Self::Date(b)) => Some(*a).cmp(&b.and_hms_opt(0, 0, 0)),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Custom { value, .. } => value.fmt(f),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Date(_) | Self::DateTime(_) => serializer.collect_str(self),
            Self::Custom { value, .. } => value.serialize(serializer),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(FieldValue::from("A").to_string(), "A");
        assert_eq!(FieldValue::Int(2020).to_string(), "2020");
        assert_eq!(FieldValue::Float(1.5).to_string(), "1.5");

        let date = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        assert_eq!(FieldValue::Date(date).to_string(), "2020-01-31");
    }

    #[test]
    fn test_custom_unwraps_for_accessors() {
        let value = FieldValue::Custom {
            type_name: "member".to_string(),
            value: Box::new(FieldValue::Int(3)),
        };
        assert_eq!(value.type_name(), "member");
        assert_eq!(value.as_int(), Some(3));
        assert_eq!(value.to_string(), "3");
    }

    #[test]
    fn test_total_cmp_mixes_numbers() {
        assert_eq!(
            FieldValue::Int(2).total_cmp(&FieldValue::Float(2.5)),
            Ordering::Less
        );
        assert_eq!(
            FieldValue::Int(10).total_cmp(&FieldValue::Int(9)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_serialize_natural_json() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 1).unwrap();
        let json = serde_json::to_value(vec![
            FieldValue::from("x"),
            FieldValue::Int(7),
            FieldValue::Date(date),
        ])
        .unwrap();
        assert_eq!(json, serde_json::json!(["x", 7, "1999-12-01"]));
    }
}
